//! Relaying connection checks and new tweets to the external network.
//!
//! Three interchangeable strategies implement [`Publisher`]. Which one is
//! used follows from the credential shape that is configured:
//!
//! * OAuth1 keys → [`OAuth1Client`]
//! * cookie pair → [`SessionClient`], or [`DirectApiClient`] when the
//!   `direct` transport is configured
//!
//! None of the clients retry. Every request is bounded by the configured
//! timeout.

mod direct;
mod oauth1;
mod session;

pub use direct::DirectApiClient;
pub use oauth1::{OAuth1Client, OAuth1Signer};
pub use session::SessionClient;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use thiserror::Error;

use chirpdeck_types::{PublishedTweet, PublisherIdentity};

use crate::config::{self, PublisherTransport};
use crate::credentials::Credentials;
use crate::db::repositories::{CredentialRepository, RepositoryError};

/// Public bearer token the web client sends with session-authenticated calls
pub(crate) const WEB_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("{0}")]
    Validation(String),

    #[error("Twitter credentials not configured")]
    NotConfigured,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to create tweet: {0}")]
    Publish(String),

    #[error("Failed to initialize Twitter client: {0}")]
    Client(String),

    #[error("Twitter request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    /// Fetch the identity the credentials belong to
    async fn check_connection(&self) -> Result<PublisherIdentity, PublisherError>;

    /// Post `text` and return the external id; `text` is already validated
    async fn send_text(&self, text: &str) -> Result<String, PublisherError>;

    /// Validate and publish `text`
    async fn publish_text(&self, text: &str) -> Result<PublishedTweet, PublisherError> {
        if text.trim().is_empty() {
            return Err(PublisherError::Validation("Text is required".to_string()));
        }

        let id = self.send_text(text).await?;
        Ok(PublishedTweet {
            id,
            text: text.to_string(),
        })
    }
}

/// Endpoints and limits shared by every strategy
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_base: String,
    pub graphql_base: String,
    pub timeout: Duration,
}

impl Endpoints {
    pub fn from_settings(settings: &config::Publisher) -> Self {
        Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            graphql_base: settings.graphql_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
        }
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, PublisherError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// Credentials to publish with: configured OAuth1 keys win over the store
pub fn resolve_credentials(
    settings: &config::Publisher,
    store: &CredentialRepository,
) -> Result<Credentials, PublisherError> {
    let keys = &settings.oauth1;
    let configured = [
        &keys.api_key,
        &keys.api_secret,
        &keys.access_token,
        &keys.access_token_secret,
    ];

    if configured.iter().all(|v| v.is_some()) {
        if let Ok(credentials) = Credentials::oauth1(
            keys.api_key.as_deref(),
            keys.api_secret.as_deref(),
            keys.access_token.as_deref(),
            keys.access_token_secret.as_deref(),
        ) {
            return Ok(credentials);
        }
    }
    if configured.iter().any(|v| v.is_some()) {
        tracing::warn!("Ignoring incomplete OAuth1 keys from configuration");
    }

    store.active()?.ok_or(PublisherError::NotConfigured)
}

/// Pick the strategy matching the credential shape
pub fn build_publisher(
    settings: &config::Publisher,
    credentials: Credentials,
) -> Result<Box<dyn Publisher>, PublisherError> {
    let endpoints = Endpoints::from_settings(settings);

    match credentials {
        Credentials::OAuth1(keys) => Ok(Box::new(OAuth1Client::new(keys, endpoints)?)),
        Credentials::Cookie { auth_token, ct0 } => match settings.transport {
            PublisherTransport::Session => {
                Ok(Box::new(SessionClient::new(auth_token, ct0, endpoints)?))
            }
            PublisherTransport::Direct => {
                Ok(Box::new(DirectApiClient::new(auth_token, ct0, endpoints)?))
            }
        },
        Credentials::Login { .. } => Err(PublisherError::Auth(
            "a username/password pair cannot open a session; configure a cookie pair or OAuth1 keys"
                .to_string(),
        )),
    }
}

/// Read a JSON body, turning non-success responses into `on_failure` errors
pub(crate) async fn read_json(
    response: Response,
    on_failure: fn(String) -> PublisherError,
) -> Result<serde_json::Value, PublisherError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| on_failure(e.to_string()))?;

    if !status.is_success() {
        return Err(on_failure(describe_failure(status, &body)));
    }

    serde_json::from_str(&body)
        .map_err(|e| on_failure(format!("unexpected response body: {}", e)))
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    // Prefer the API's own error text when it sends one
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/errors/0/message")
                .or_else(|| v.get("detail"))
                .or_else(|| v.get("title"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    format!("status {}: {}", status.as_u16(), detail)
}

/// `Cookie` header replaying a browser session
pub(crate) fn session_cookie(auth_token: &str, ct0: &str) -> String {
    format!("auth_token={}; ct0={}", auth_token, ct0)
}
