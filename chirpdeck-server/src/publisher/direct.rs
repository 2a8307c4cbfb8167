use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::{json, Value};

use chirpdeck_types::PublisherIdentity;

use super::session::session_headers;
use super::{read_json, Endpoints, Publisher, PublisherError};

const VIEWER_QUERY_ID: &str = "k3027HdkVqbuDPpdoniLKA";
const CREATE_TWEET_QUERY_ID: &str = "a1p9RWpkYKBjWv_I3WzS-A";

/// Emulates the web client's private GraphQL calls with a session's cookies
pub struct DirectApiClient {
    http: reqwest::Client,
    headers: HeaderMap,
    endpoints: Endpoints,
}

impl DirectApiClient {
    pub fn new(auth_token: String, ct0: String, endpoints: Endpoints) -> Result<Self, PublisherError> {
        Ok(Self {
            http: endpoints.http_client()?,
            headers: session_headers(&auth_token, &ct0)?,
            endpoints,
        })
    }

    fn operation_url(&self, query_id: &str, operation: &str) -> String {
        format!("{}/{}/{}", self.endpoints.graphql_base, query_id, operation)
    }
}

fn create_tweet_payload(text: &str) -> Value {
    json!({
        "variables": {
            "tweet_text": text,
            "dark_request": false,
            "media": { "media_entities": [], "possibly_sensitive": false },
            "semantic_annotation_ids": []
        },
        "features": {
            "tweetypie_unmention_optimization_enabled": true,
            "responsive_web_edit_tweet_api_enabled": true,
            "view_counts_everywhere_api_enabled": true,
            "longform_notetweets_consumption_enabled": true,
            "responsive_web_graphql_timeline_navigation_enabled": true,
            "responsive_web_enhance_cards_enabled": false
        },
        "queryId": CREATE_TWEET_QUERY_ID
    })
}

/// GraphQL reports failures inside a 200 response
fn graphql_error(body: &Value) -> Option<String> {
    body.get("errors")
        .and_then(|errors| errors.as_array())
        .filter(|errors| !errors.is_empty())
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; ")
        })
}

fn parse_created_id(body: &Value) -> Result<String, PublisherError> {
    if let Some(message) = graphql_error(body) {
        return Err(PublisherError::Publish(message));
    }

    body.pointer("/data/create_tweet/tweet_results/result/rest_id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| PublisherError::Publish("response carried no tweet id".to_string()))
}

fn parse_viewer(body: &Value) -> Result<PublisherIdentity, PublisherError> {
    if let Some(message) = graphql_error(body) {
        return Err(PublisherError::Auth(message));
    }

    let user = body
        .pointer("/data/viewer/user_results/result")
        .ok_or_else(|| PublisherError::Auth("session did not resolve to an account".to_string()))?;
    let text = |pointer: &str| {
        user.pointer(pointer)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    match (text("/rest_id"), text("/legacy/screen_name")) {
        (Some(id), Some(username)) => Ok(PublisherIdentity {
            name: text("/legacy/name").unwrap_or_else(|| username.clone()),
            id,
            username,
        }),
        _ => Err(PublisherError::Auth(
            "session did not resolve to an account".to_string(),
        )),
    }
}

#[async_trait]
impl Publisher for DirectApiClient {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn check_connection(&self) -> Result<PublisherIdentity, PublisherError> {
        let variables = json!({ "withCommunitiesMemberships": false }).to_string();
        let response = self
            .http
            .get(self.operation_url(VIEWER_QUERY_ID, "Viewer"))
            .headers(self.headers.clone())
            .query(&[("variables", variables.as_str())])
            .send()
            .await
            .map_err(|e| PublisherError::Auth(e.to_string()))?;

        let body = read_json(response, PublisherError::Auth).await?;
        parse_viewer(&body)
    }

    async fn send_text(&self, text: &str) -> Result<String, PublisherError> {
        let response = self
            .http
            .post(self.operation_url(CREATE_TWEET_QUERY_ID, "CreateTweet"))
            .headers(self.headers.clone())
            .json(&create_tweet_payload(text))
            .send()
            .await
            .map_err(|e| PublisherError::Publish(e.to_string()))?;

        let body = read_json(response, PublisherError::Publish).await?;
        parse_created_id(&body)
    }
}
