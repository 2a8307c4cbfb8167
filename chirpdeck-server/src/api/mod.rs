pub mod accounts;
pub mod credentials;
pub mod error;
pub mod likes;
pub mod posts;
pub mod publish;

pub use error::{ApiError, ApiResult};
