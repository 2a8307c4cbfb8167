//! Third-party credential shapes and their validation.
//!
//! A credential is exactly one of three shapes. Constructors trim every
//! field and reject the shape if any required field ends up empty, naming
//! all of the missing fields at once.

use std::fmt;
use thiserror::Error;

use chirpdeck_types::CredentialKind;

/// Delimiter used to pack a login pair into a single stored field
pub const LOGIN_DELIMITER: char = ':';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Missing required fields: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("username must not contain '{}'", LOGIN_DELIMITER)]
    DelimiterInUsername,
}

#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Captured browser session: `auth_token` cookie plus the `ct0` CSRF token
    Cookie { auth_token: String, ct0: String },
    Login { username: String, password: String },
    OAuth1(OAuth1Credentials),
}

fn required(
    name: &'static str,
    value: Option<&str>,
    missing: &mut Vec<&'static str>,
) -> String {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        missing.push(name);
    }
    value.to_string()
}

fn finish<T>(missing: Vec<&'static str>, value: T) -> Result<T, CredentialError> {
    if missing.is_empty() {
        Ok(value)
    } else {
        Err(CredentialError::Missing(missing))
    }
}

impl Credentials {
    /// Cookie pair; a blank `ct0` falls back to the auth token
    pub fn cookie(auth_token: Option<&str>, ct0: Option<&str>) -> Result<Self, CredentialError> {
        let mut missing = Vec::new();
        let auth_token = required("auth_token", auth_token, &mut missing);
        let ct0 = ct0
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| auth_token.clone());

        finish(missing, Credentials::Cookie { auth_token, ct0 })
    }

    pub fn login(username: Option<&str>, password: Option<&str>) -> Result<Self, CredentialError> {
        let mut missing = Vec::new();
        let username = required("username", username, &mut missing);
        let password = required("password", password, &mut missing);
        let login = finish(missing, Credentials::Login { username, password })?;

        match &login {
            Credentials::Login { username, .. } if username.contains(LOGIN_DELIMITER) => {
                Err(CredentialError::DelimiterInUsername)
            }
            _ => Ok(login),
        }
    }

    pub fn oauth1(
        api_key: Option<&str>,
        api_secret: Option<&str>,
        access_token: Option<&str>,
        access_token_secret: Option<&str>,
    ) -> Result<Self, CredentialError> {
        let mut missing = Vec::new();
        let keys = OAuth1Credentials {
            api_key: required("api_key", api_key, &mut missing),
            api_secret: required("api_secret", api_secret, &mut missing),
            access_token: required("access_token", access_token, &mut missing),
            access_token_secret: required("access_token_secret", access_token_secret, &mut missing),
        };

        finish(missing, Credentials::OAuth1(keys))
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            Credentials::Cookie { .. } => CredentialKind::Cookie,
            Credentials::Login { .. } => CredentialKind::Login,
            Credentials::OAuth1(_) => CredentialKind::OAuth1,
        }
    }

    /// `username:password` as stored
    pub fn packed_login(username: &str, password: &str) -> String {
        format!("{}{}{}", username, LOGIN_DELIMITER, password)
    }

    /// Split a stored login at the first delimiter; the password may contain it
    pub fn unpack_login(packed: &str) -> Option<(String, String)> {
        packed
            .split_once(LOGIN_DELIMITER)
            .map(|(user, pass)| (user.to_string(), pass.to_string()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secret values never reach logs
        match self {
            Credentials::Cookie { .. } => f.write_str("Credentials::Cookie(<redacted>)"),
            Credentials::Login { username, .. } => {
                write!(f, "Credentials::Login({}, <redacted>)", username)
            }
            Credentials::OAuth1(_) => f.write_str("Credentials::OAuth1(<redacted>)"),
        }
    }
}

impl fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OAuth1Credentials(<redacted>)")
    }
}
