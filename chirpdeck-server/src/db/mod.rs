pub mod schema;
pub mod connection;
pub mod repositories;
pub mod timestamp;

pub use connection::{Database, DbConnection, DbPool};
pub use schema::DbSchema;
