use rusqlite::{Connection, OptionalExtension, Row};

use chirpdeck_types::Account;

use super::error::{is_unique_violation, RepositoryError, RepositoryResult};
use crate::db::{timestamp, Database, DbPool, DbSchema};

const ACCOUNT_COLUMNS: &str =
    "id, username, auth_token, avatar_url, is_active, created_at, updated_at";

pub struct AccountRepository {
    pool: DbPool,
    schema: DbSchema,
}

impl AccountRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool.clone(),
            schema: db.schema.clone(),
        }
    }

    /// All accounts, newest first
    pub fn list(&self) -> RepositoryResult<Vec<Account>> {
        let conn = self.pool.get()?;
        let sql = self.schema.render(&format!(
            "SELECT {} FROM {{schema}}.accounts ORDER BY created_at DESC, id DESC",
            ACCOUNT_COLUMNS
        ));
        let mut stmt = conn.prepare(&sql)?;

        let accounts = stmt
            .query_map([], map_account)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get account by ID
    pub fn get(&self, account_id: i64) -> RepositoryResult<Option<Account>> {
        let conn = self.pool.get()?;
        Ok(fetch_account(&conn, &self.schema, account_id)?)
    }

    /// Register a new account; usernames are unique
    pub fn create(
        &self,
        username: &str,
        auth_token: &str,
        avatar_url: Option<&str>,
    ) -> RepositoryResult<Account> {
        let username = username.trim();
        let auth_token = auth_token.trim();
        if username.is_empty() || auth_token.is_empty() {
            return Err(RepositoryError::Validation(
                "Username and authToken are required".to_string(),
            ));
        }

        let conn = self.pool.get()?;
        let now = timestamp::now();
        let sql = self.schema.render(&format!(
            "INSERT INTO {{schema}}.accounts (username, auth_token, avatar_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {}",
            ACCOUNT_COLUMNS
        ));

        conn.query_row(
            &sql,
            (username, auth_token, avatar_url.unwrap_or("").trim(), &now),
            map_account,
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Duplicate("Account with this username already exists".to_string())
            } else {
                e.into()
            }
        })
    }

    /// Toggle whether the account takes part in engagement simulation
    pub fn set_active(&self, account_id: i64, is_active: bool) -> RepositoryResult<Account> {
        let conn = self.pool.get()?;
        let sql = self.schema.render(&format!(
            "UPDATE {{schema}}.accounts SET is_active = ?1, updated_at = ?2 WHERE id = ?3
             RETURNING {}",
            ACCOUNT_COLUMNS
        ));

        conn.query_row(&sql, (is_active, timestamp::now(), account_id), map_account)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound("Account not found".to_string()))
    }
}

pub(crate) fn fetch_account(
    conn: &Connection,
    schema: &DbSchema,
    account_id: i64,
) -> rusqlite::Result<Option<Account>> {
    let sql = schema.render(&format!(
        "SELECT {} FROM {{schema}}.accounts WHERE id = ?1",
        ACCOUNT_COLUMNS
    ));
    conn.query_row(&sql, [account_id], map_account).optional()
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        auth_token: row.get(2)?,
        avatar_url: row.get(3)?,
        is_active: row.get(4)?,
        created_at: timestamp::from_db(5, &row.get::<_, String>(5)?)?,
        updated_at: timestamp::from_db(6, &row.get::<_, String>(6)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> AccountRepository {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        AccountRepository::new(&db)
    }

    #[test]
    fn test_create_then_list_round_trip() {
        let repo = setup();
        let created = repo
            .create("acct1", "tok", Some("https://img.example/a.png"))
            .expect("Failed to create account");

        let accounts = repo.list().expect("Failed to list accounts");
        assert_eq!(accounts.len(), 1);
        let listed = &accounts[0];
        assert_eq!(listed.id, created.id);
        assert_eq!(listed.username, "acct1");
        assert_eq!(listed.auth_token, "tok");
        assert_eq!(listed.avatar_url, "https://img.example/a.png");
        assert!(listed.is_active, "accounts start active");
        assert_eq!(listed.created_at, created.created_at);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let repo = setup();
        repo.create("acct1", "tok", None).expect("Failed to create account");

        let err = repo.create("acct1", "other", None).unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
        assert_eq!(repo.list().unwrap().len(), 1, "no second row may exist");
    }

    #[test]
    fn test_blank_fields_rejected() {
        let repo = setup();
        assert!(matches!(
            repo.create("  ", "tok", None),
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            repo.create("acct", "", None),
            Err(RepositoryError::Validation(_))
        ));
    }

    #[test]
    fn test_list_orders_newest_first() {
        let repo = setup();
        repo.create("first", "t1", None).unwrap();
        repo.create("second", "t2", None).unwrap();
        repo.create("third", "t3", None).unwrap();

        let names: Vec<String> = repo.list().unwrap().into_iter().map(|a| a.username).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_set_active_toggles_and_stamps() {
        let repo = setup();
        let account = repo.create("acct1", "tok", None).unwrap();

        let paused = repo.set_active(account.id, false).unwrap();
        assert!(!paused.is_active);
        assert!(paused.updated_at >= account.updated_at);

        let reloaded = repo.get(account.id).unwrap().unwrap();
        assert!(!reloaded.is_active);
    }

    #[test]
    fn test_set_active_missing_account() {
        let repo = setup();
        assert!(matches!(
            repo.set_active(999, true),
            Err(RepositoryError::NotFound(_))
        ));
    }
}
