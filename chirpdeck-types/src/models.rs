use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{CredentialKind, PostStatus};

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

mod optional_datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// A managed identity in the account pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    /// Account-specific opaque token; never sent back to clients
    #[serde(skip_serializing, default)]
    pub auth_token: String,
    pub avatar_url: String,
    pub is_active: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub account_id: Option<i64>,
    /// Username of the owning account (None when the post has no owner)
    #[serde(default)]
    pub account_username: Option<String>,
    pub content: String,
    pub video_url: Option<String>,
    pub video_name: Option<String>,
    #[serde(with = "datetime_format")]
    pub scheduled_time: DateTime<Utc>,
    #[serde(with = "optional_datetime_format", default)]
    pub published_at: Option<DateTime<Utc>>,
    pub status: PostStatus,
    pub twitter_post_id: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

/// A simulated endorsement of a post by one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub post_id: i64,
    pub account_id: i64,
    #[serde(with = "datetime_format")]
    pub liked_at: DateTime<Utc>,
    pub is_mutual: bool,
    pub delay_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_content: Option<String>,
}

/// Which credential fields are filled in, without the values themselves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub configured: bool,
    #[serde(default)]
    pub kind: Option<CredentialKind>,
    pub has_auth_token: bool,
    pub has_ct0: bool,
    pub has_username: bool,
    pub has_password: bool,
    pub has_api_key: bool,
    pub has_api_secret: bool,
    pub has_access_token: bool,
    pub has_access_token_secret: bool,
    #[serde(with = "optional_datetime_format", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Identity reported by the external network for the configured credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherIdentity {
    pub id: String,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedTweet {
    pub id: String,
    pub text: String,
}

// Request/Response types for API
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub username: Option<String>,
    pub auth_token: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub id: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub account_id: Option<i64>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub video_name: Option<String>,
    pub scheduled_time: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostStatusRequest {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub twitter_post_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateLikesRequest {
    pub post_id: Option<i64>,
    pub likes_count: Option<i64>,
    pub is_mutual: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CookieCredentialsRequest {
    pub auth_token: Option<String>,
    pub ct0: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginCredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OAuth1CredentialsRequest {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub text: Option<String>,
    pub post_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: Account,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub post: Post,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikesResponse {
    pub likes: Vec<Like>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulatedLikesResponse {
    pub likes: Vec<Like>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsSavedResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionCheckResponse {
    pub success: bool,
    pub message: String,
    pub user: PublisherIdentity,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub success: bool,
    pub message: String,
    pub tweet: PublishedTweet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
