use crate::config;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub publisher: config::Publisher,
}

impl AppState {
    pub fn new(db: Database, publisher: config::Publisher) -> Self {
        Self { db, publisher }
    }
}
