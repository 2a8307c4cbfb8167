use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};

use chirpdeck_types::PublisherIdentity;

use super::{read_json, session_cookie, Endpoints, Publisher, PublisherError, WEB_BEARER_TOKEN};

/// Replays a browser session (auth_token + ct0 cookies) against the v1.1 API
pub struct SessionClient {
    http: reqwest::Client,
    headers: HeaderMap,
    endpoints: Endpoints,
}

impl SessionClient {
    pub fn new(auth_token: String, ct0: String, endpoints: Endpoints) -> Result<Self, PublisherError> {
        Ok(Self {
            http: endpoints.http_client()?,
            headers: session_headers(&auth_token, &ct0)?,
            endpoints,
        })
    }
}

/// Headers the web client sends with every session request
pub(crate) fn session_headers(auth_token: &str, ct0: &str) -> Result<HeaderMap, PublisherError> {
    let value = |v: String| {
        HeaderValue::from_str(&v)
            .map_err(|_| PublisherError::Client("credentials contain invalid header characters".to_string()))
    };

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value(format!("Bearer {}", WEB_BEARER_TOKEN))?);
    headers.insert(COOKIE, value(session_cookie(auth_token, ct0))?);
    headers.insert("x-csrf-token", value(ct0.to_string())?);
    headers.insert("x-twitter-auth-type", HeaderValue::from_static("OAuth2Session"));
    headers.insert("x-twitter-active-user", HeaderValue::from_static("yes"));
    Ok(headers)
}

#[async_trait]
impl Publisher for SessionClient {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn check_connection(&self) -> Result<PublisherIdentity, PublisherError> {
        let url = format!("{}/1.1/account/verify_credentials.json", self.endpoints.api_base);
        let response = self
            .http
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| PublisherError::Auth(e.to_string()))?;
        let body = read_json(response, PublisherError::Auth).await?;

        let field = |name: &str| body.get(name).and_then(|v| v.as_str()).map(str::to_string);

        match (field("id_str"), field("screen_name")) {
            (Some(id), Some(username)) => Ok(PublisherIdentity {
                name: field("name").unwrap_or_else(|| username.clone()),
                id,
                username,
            }),
            _ => Err(PublisherError::Auth(
                "session did not resolve to an account".to_string(),
            )),
        }
    }

    async fn send_text(&self, text: &str) -> Result<String, PublisherError> {
        let url = format!("{}/1.1/statuses/update.json", self.endpoints.api_base);
        let response = self
            .http
            .post(&url)
            .headers(self.headers.clone())
            .form(&[("status", text)])
            .send()
            .await
            .map_err(|e| PublisherError::Publish(e.to_string()))?;
        let body = read_json(response, PublisherError::Publish).await?;

        body.get("id_str")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| PublisherError::Publish("response carried no tweet id".to_string()))
    }
}
