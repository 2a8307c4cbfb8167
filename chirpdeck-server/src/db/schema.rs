use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Tables, constraints and indexes for the scheduling backend.
///
/// `{schema}` is replaced with a validated [`DbSchema`] qualifier before the
/// batch runs. SQLite only accepts the schema prefix on the created object's
/// own name, so `ON` clauses and foreign keys stay unqualified.
pub const SCHEMA: &str = r#"
-- Managed identities
CREATE TABLE IF NOT EXISTS {schema}.accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    auth_token TEXT NOT NULL,
    avatar_url TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS {schema}.idx_accounts_created_at ON accounts(created_at DESC);
CREATE INDEX IF NOT EXISTS {schema}.idx_accounts_active ON accounts(is_active);

-- Scheduled content
CREATE TABLE IF NOT EXISTS {schema}.posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER,
    content TEXT NOT NULL,
    video_url TEXT,
    video_name TEXT,
    scheduled_time TEXT NOT NULL,
    published_at TEXT,
    status TEXT NOT NULL DEFAULT 'scheduled' CHECK(status IN ('draft', 'scheduled', 'published')),
    twitter_post_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS {schema}.idx_posts_scheduled_time ON posts(scheduled_time DESC);
CREATE INDEX IF NOT EXISTS {schema}.idx_posts_account_id ON posts(account_id);

-- Simulated endorsements, one per (post, account)
CREATE TABLE IF NOT EXISTS {schema}.likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    account_id INTEGER NOT NULL,
    liked_at TEXT NOT NULL,
    is_mutual INTEGER NOT NULL DEFAULT 1,
    delay_minutes INTEGER NOT NULL,
    UNIQUE (post_id, account_id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS {schema}.idx_likes_post_id ON likes(post_id);
CREATE INDEX IF NOT EXISTS {schema}.idx_likes_liked_at ON likes(liked_at DESC);

-- Third-party credentials; replaced wholesale, at most one row
CREATE TABLE IF NOT EXISTS {schema}.twitter_auth (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK(kind IN ('cookie', 'login', 'oauth1')),
    auth_token TEXT,
    ct0 TEXT,
    login TEXT,
    api_key TEXT,
    api_secret TEXT,
    access_token TEXT,
    access_token_secret TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier regex is valid"));

/// Schema qualifier resolved once at startup and reused for every statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSchema {
    name: String,
}

impl DbSchema {
    /// Validate a configured schema name.
    ///
    /// `public` (the conventional default) and `main` both map to SQLite's
    /// primary database. Anything else must be a plain identifier and is
    /// attached as a separate database under that name.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        if trimmed.eq_ignore_ascii_case("public") || trimmed.eq_ignore_ascii_case("main") {
            return Ok(Self::main());
        }
        if !IDENTIFIER.is_match(trimmed) {
            bail!("Invalid database schema name '{}'", raw);
        }
        if trimmed.eq_ignore_ascii_case("temp") {
            bail!("Database schema name 'temp' is reserved");
        }

        Ok(Self {
            name: trimmed.to_string(),
        })
    }

    pub fn main() -> Self {
        Self {
            name: "main".to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the schema lives in the primary database file
    pub fn is_main(&self) -> bool {
        self.name == "main"
    }

    /// Render a statement template, substituting `{schema}`
    pub fn render(&self, template: &str) -> String {
        template.replace("{schema}", &format!("\"{}\"", self.name))
    }
}

impl Default for DbSchema {
    fn default() -> Self {
        Self::main()
    }
}
