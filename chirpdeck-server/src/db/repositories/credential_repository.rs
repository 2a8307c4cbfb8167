use rusqlite::{OptionalExtension, Row, TransactionBehavior};

use chirpdeck_types::{CredentialKind, CredentialStatus};

use super::error::RepositoryResult;
use crate::credentials::{Credentials, OAuth1Credentials};
use crate::db::{timestamp, Database, DbPool, DbSchema};

const CREDENTIAL_COLUMNS: &str = "kind, auth_token, ct0, login, api_key, api_secret,
     access_token, access_token_secret, created_at, updated_at";

/// The singleton credential row as stored
struct StoredCredentials {
    kind: String,
    auth_token: Option<String>,
    ct0: Option<String>,
    login: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
    created_at: String,
    updated_at: String,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

pub struct CredentialRepository {
    pool: DbPool,
    schema: DbSchema,
}

impl CredentialRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool.clone(),
            schema: db.schema.clone(),
        }
    }

    fn load(&self) -> RepositoryResult<Option<StoredCredentials>> {
        let conn = self.pool.get()?;
        let sql = self.schema.render(&format!(
            "SELECT {} FROM {{schema}}.twitter_auth ORDER BY created_at DESC, id DESC LIMIT 1",
            CREDENTIAL_COLUMNS
        ));
        Ok(conn.query_row(&sql, [], map_stored).optional()?)
    }

    /// Which credential fields are filled in, never the values
    pub fn status(&self) -> RepositoryResult<CredentialStatus> {
        let Some(stored) = self.load()? else {
            return Ok(CredentialStatus::default());
        };

        let (has_username, has_password) = match stored.login.as_deref().and_then(Credentials::unpack_login) {
            Some((user, pass)) => (!user.is_empty(), !pass.is_empty()),
            None => (false, false),
        };
        let kind = CredentialKind::parse(&stored.kind);

        let status = CredentialStatus {
            configured: false,
            kind,
            has_auth_token: filled(&stored.auth_token),
            has_ct0: filled(&stored.ct0),
            has_username,
            has_password,
            has_api_key: filled(&stored.api_key),
            has_api_secret: filled(&stored.api_secret),
            has_access_token: filled(&stored.access_token),
            has_access_token_secret: filled(&stored.access_token_secret),
            updated_at: timestamp::from_db(9, &stored.updated_at)
                .or_else(|_| timestamp::from_db(8, &stored.created_at))
                .ok(),
        };

        let configured = match kind {
            Some(CredentialKind::Cookie) => status.has_auth_token,
            Some(CredentialKind::Login) => status.has_username && status.has_password,
            Some(CredentialKind::OAuth1) => {
                status.has_api_key
                    && status.has_api_secret
                    && status.has_access_token
                    && status.has_access_token_secret
            }
            None => false,
        };

        Ok(CredentialStatus { configured, ..status })
    }

    /// The configured credentials, if a complete record is stored
    pub fn active(&self) -> RepositoryResult<Option<Credentials>> {
        let Some(stored) = self.load()? else {
            return Ok(None);
        };

        let credentials = match CredentialKind::parse(&stored.kind) {
            Some(CredentialKind::Cookie) => {
                Credentials::cookie(stored.auth_token.as_deref(), stored.ct0.as_deref()).ok()
            }
            Some(CredentialKind::Login) => stored
                .login
                .as_deref()
                .and_then(Credentials::unpack_login)
                .and_then(|(user, pass)| Credentials::login(Some(&user), Some(&pass)).ok()),
            Some(CredentialKind::OAuth1) => Credentials::oauth1(
                stored.api_key.as_deref(),
                stored.api_secret.as_deref(),
                stored.access_token.as_deref(),
                stored.access_token_secret.as_deref(),
            )
            .ok(),
            None => None,
        };

        Ok(credentials)
    }

    /// Discard whatever is stored and keep only `credentials`.
    ///
    /// Delete and insert share one IMMEDIATE transaction: concurrent writers
    /// queue behind each other and a failure leaves the previous row intact.
    pub fn replace(&self, credentials: &Credentials) -> RepositoryResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(&self.schema.render("DELETE FROM {schema}.twitter_auth"), [])?;

        let now = timestamp::now();
        let (auth_token, ct0, login, oauth1) = match credentials {
            Credentials::Cookie { auth_token, ct0 } => {
                (Some(auth_token.as_str()), Some(ct0.as_str()), None, None)
            }
            Credentials::Login { username, password } => {
                (None, None, Some(Credentials::packed_login(username, password)), None)
            }
            Credentials::OAuth1(keys) => (None, None, None, Some(keys)),
        };

        let sql = self.schema.render(
            "INSERT INTO {schema}.twitter_auth
                (kind, auth_token, ct0, login, api_key, api_secret, access_token,
                 access_token_secret, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        );
        tx.execute(
            &sql,
            rusqlite::params![
                credentials.kind().as_str(),
                auth_token,
                ct0,
                login,
                oauth1.map(|k: &OAuth1Credentials| k.api_key.as_str()),
                oauth1.map(|k| k.api_secret.as_str()),
                oauth1.map(|k| k.access_token.as_str()),
                oauth1.map(|k| k.access_token_secret.as_str()),
                now,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn map_stored(row: &Row<'_>) -> rusqlite::Result<StoredCredentials> {
    Ok(StoredCredentials {
        kind: row.get(0)?,
        auth_token: row.get(1)?,
        ct0: row.get(2)?,
        login: row.get(3)?,
        api_key: row.get(4)?,
        api_secret: row.get(5)?,
        access_token: row.get(6)?,
        access_token_secret: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, CredentialRepository) {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        let repo = CredentialRepository::new(&db);
        (db, repo)
    }

    fn row_count(db: &Database) -> i64 {
        let conn = db.connection().unwrap();
        conn.query_row(
            &db.schema.render("SELECT COUNT(*) FROM {schema}.twitter_auth"),
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_store_is_not_configured() {
        let (_db, repo) = setup();
        let status = repo.status().unwrap();
        assert!(!status.configured);
        assert!(status.kind.is_none());
        assert!(repo.active().unwrap().is_none());
    }

    #[test]
    fn test_replace_keeps_a_single_row() {
        let (db, repo) = setup();
        let cookie = Credentials::cookie(Some("tok"), Some("csrf")).unwrap();
        let oauth = Credentials::oauth1(Some("k"), Some("s"), Some("t"), Some("ts")).unwrap();

        repo.replace(&cookie).unwrap();
        repo.replace(&oauth).unwrap();

        assert_eq!(row_count(&db), 1);
        assert_eq!(repo.active().unwrap(), Some(oauth));

        let status = repo.status().unwrap();
        assert!(status.configured);
        assert_eq!(status.kind, Some(CredentialKind::OAuth1));
        assert!(status.has_api_key && status.has_access_token_secret);
        assert!(!status.has_auth_token);
        assert!(status.updated_at.is_some());
    }

    #[test]
    fn test_login_round_trips_through_packed_field() {
        let (db, repo) = setup();
        let login = Credentials::login(Some("alice"), Some("s3:cret")).unwrap();
        repo.replace(&login).unwrap();

        assert_eq!(repo.active().unwrap(), Some(login));
        let status = repo.status().unwrap();
        assert!(status.configured && status.has_username && status.has_password);

        let conn = db.connection().unwrap();
        let packed: String = conn
            .query_row(
                &db.schema.render("SELECT login FROM {schema}.twitter_auth"),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(packed, "alice:s3:cret");
    }

    #[test]
    fn test_failed_replace_keeps_previous_credentials() {
        let (db, repo) = setup();
        let cookie = Credentials::cookie(Some("tok"), None).unwrap();
        repo.replace(&cookie).unwrap();

        // A write that fails inside the transaction must roll the delete back
        let conn = db.connection().unwrap();
        conn.execute_batch(&db.schema.render(
            "CREATE TRIGGER {schema}.reject_insert BEFORE INSERT ON twitter_auth
             BEGIN SELECT RAISE(ABORT, 'storage unavailable'); END;",
        ))
        .unwrap();
        drop(conn);

        let oauth = Credentials::oauth1(Some("k"), Some("s"), Some("t"), Some("ts")).unwrap();
        assert!(repo.replace(&oauth).is_err());

        assert_eq!(row_count(&db), 1);
        assert_eq!(repo.active().unwrap(), Some(cookie));
        assert_eq!(repo.status().unwrap().kind, Some(CredentialKind::Cookie));
    }
}
