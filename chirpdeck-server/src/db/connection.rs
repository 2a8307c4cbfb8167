use anyhow::{bail, Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use super::schema::{DbSchema, SCHEMA};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
    pub schema: DbSchema,
}

/// Where the primary database and an attached schema database live
enum Location {
    File { main: PathBuf, attached: PathBuf },
    Memory { main: String, attached: String },
}

impl Database {
    /// Create a new database connection pool with tables under `schema`
    pub fn new<P: AsRef<Path>>(path: P, schema: &str) -> Result<Self> {
        let schema = DbSchema::parse(schema)?;
        let location = Self::resolve_location(path.as_ref(), &schema)?;
        let manager = Self::create_connection_manager(location, schema.clone());
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool, schema })
    }

    /// Work out the primary database and the attached schema database.
    ///
    /// Every in-memory pool gets its own shared-cache name so that pooled
    /// connections see the same data while separate pools stay isolated.
    fn resolve_location(path: &Path, schema: &DbSchema) -> Result<Location> {
        let path_str = path.to_string_lossy();
        let trimmed_path = path_str.trim();

        if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            let name = format!("chirpdeck-{}", Uuid::new_v4());
            return Ok(Location::Memory {
                main: format!("file:{}?mode=memory&cache=shared", name),
                attached: format!("file:{}-{}?mode=memory&cache=shared", name, schema.name()),
            });
        }

        if trimmed_path.contains("://") {
            bail!(
                "Unsupported database location '{}': expected a SQLite file path or :memory:",
                trimmed_path
            );
        }

        let main = PathBuf::from(trimmed_path);
        let attached = main
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join(format!("{}.db", schema.name()));

        Ok(Location::File { main, attached })
    }

    /// Create a connection manager that prepares every new connection
    fn create_connection_manager(location: Location, schema: DbSchema) -> SqliteConnectionManager {
        let (manager, attached) = match location {
            Location::File { main, attached } => (
                SqliteConnectionManager::file(main),
                attached.to_string_lossy().into_owned(),
            ),
            Location::Memory { main, attached } => (SqliteConnectionManager::file(main), attached),
        };

        manager.with_init(move |conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            if !schema.is_main() {
                conn.execute(
                    &format!("ATTACH DATABASE ?1 AS \"{}\"", schema.name()),
                    [&attached],
                )?;
            }
            Ok(())
        })
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH, "public")
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(&self.schema.render(SCHEMA))
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}
