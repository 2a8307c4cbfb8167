use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
    /// Schema the tables live in; validated once when the pool is built
    pub schema: String,
}

/// How cookie-pair credentials reach the external network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublisherTransport {
    /// Legacy REST endpoints driven by a replayed browser session
    #[default]
    Session,
    /// Hand-built GraphQL payloads against the private web API
    Direct,
}

/// OAuth1 keys supplied through configuration rather than the credential store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuth1Keys {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Publisher {
    pub transport: PublisherTransport,
    pub timeout_secs: u64,
    pub api_base: String,
    pub graphql_base: String,
    #[serde(default)]
    pub oauth1: OAuth1Keys,
}

impl Default for Publisher {
    fn default() -> Self {
        Self {
            transport: PublisherTransport::Session,
            timeout_secs: DEFAULT_PUBLISHER_TIMEOUT_SECS,
            api_base: DEFAULT_API_BASE.to_string(),
            graphql_base: DEFAULT_GRAPHQL_BASE.to_string(),
            oauth1: OAuth1Keys::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub publisher: Publisher,
}

pub const DEFAULT_PUBLISHER_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_GRAPHQL_BASE: &str = "https://x.com/i/api/graphql";

/// Environment variables that override individual settings keys
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("DATABASE_PATH", "database.path"),
    ("DATABASE_URL", "database.path"),
    ("MAIN_DB_SCHEMA", "database.schema"),
    ("PUBLISHER_TRANSPORT", "publisher.transport"),
    ("PUBLISHER_TIMEOUT_SECS", "publisher.timeout_secs"),
    ("TWITTER_API_BASE", "publisher.api_base"),
    ("TWITTER_GRAPHQL_BASE", "publisher.graphql_base"),
    ("TWITTER_API_KEY", "publisher.oauth1.api_key"),
    ("TWITTER_API_SECRET", "publisher.oauth1.api_secret"),
    ("TWITTER_ACCESS_TOKEN", "publisher.oauth1.access_token"),
    ("TWITTER_ACCESS_TOKEN_SECRET", "publisher.oauth1.access_token_secret"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in chirpdeck-server directory (for development)
        let dev_path = PathBuf::from("chirpdeck-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "chirpdeck.db")?
            .set_default("database.schema", "public")?
            .set_default("publisher.transport", "session")?
            .set_default("publisher.timeout_secs", DEFAULT_PUBLISHER_TIMEOUT_SECS)?
            .set_default("publisher.api_base", DEFAULT_API_BASE)?
            .set_default("publisher.graphql_base", DEFAULT_GRAPHQL_BASE)?;

        // 2. Override with environment variables (highest priority)
        for (var, key) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    builder = builder.set_override(*key, value)?;
                }
            }
        }

        let s = builder.build()?;
        s.try_deserialize()
    }
}
