// Library exports for chirpdeck-server
// The binary and the integration tests both build on these modules

pub mod api;
pub mod app;
pub mod config;
pub mod credentials;
pub mod db;
pub mod engagement;
pub mod publisher;
pub mod state;

pub use app::router;
