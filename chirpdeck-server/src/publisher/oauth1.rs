use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Method;
use sha1::Sha1;

use chirpdeck_types::PublisherIdentity;

use super::{read_json, Endpoints, Publisher, PublisherError};
use crate::credentials::OAuth1Credentials;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// Percent-encoding from RFC 3986: everything but unreserved characters
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Signs requests with HMAC-SHA1 as described by OAuth 1.0a
pub struct OAuth1Signer {
    keys: OAuth1Credentials,
}

impl OAuth1Signer {
    pub fn new(keys: OAuth1Credentials) -> Self {
        Self { keys }
    }

    /// `Authorization` header for a request with no signed body parameters
    pub fn authorization_header(&self, method: &Method, url: &str) -> Result<String, PublisherError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();

        self.header_with(method.as_str(), url, &[], &nonce, &timestamp)
    }

    /// Build the header from a fixed nonce and timestamp
    pub fn header_with(
        &self,
        method: &str,
        url: &str,
        extra_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, PublisherError> {
        let signature = self.sign_with(method, url, extra_params, nonce, timestamp)?;

        let fields = [
            ("oauth_consumer_key", self.keys.api_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature", signature.as_str()),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.keys.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];
        let rendered: Vec<String> = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();

        Ok(format!("OAuth {}", rendered.join(", ")))
    }

    /// Base64 HMAC-SHA1 signature over the request's signature base string
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        extra_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, PublisherError> {
        let mut params: Vec<(String, String)> = extra_params
            .iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .collect();
        params.extend(
            [
                ("oauth_consumer_key", self.keys.api_key.as_str()),
                ("oauth_nonce", nonce),
                ("oauth_signature_method", "HMAC-SHA1"),
                ("oauth_timestamp", timestamp),
                ("oauth_token", self.keys.access_token.as_str()),
                ("oauth_version", "1.0"),
            ]
            .iter()
            .map(|(k, v)| (encode(k), encode(v))),
        );
        params.sort();

        let parameter_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let base = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(url),
            encode(&parameter_string)
        );
        let key = format!(
            "{}&{}",
            encode(&self.keys.api_secret),
            encode(&self.keys.access_token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| PublisherError::Client(e.to_string()))?;
        mac.update(base.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Publishes through the v2 API with user-context OAuth1 keys
pub struct OAuth1Client {
    signer: OAuth1Signer,
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl OAuth1Client {
    pub fn new(keys: OAuth1Credentials, endpoints: Endpoints) -> Result<Self, PublisherError> {
        Ok(Self {
            signer: OAuth1Signer::new(keys),
            http: endpoints.http_client()?,
            endpoints,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, PublisherError> {
        let url = format!("{}{}", self.endpoints.api_base, path);
        let header = self.signer.authorization_header(&method, &url)?;
        Ok(self
            .http
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, header))
    }
}

#[async_trait]
impl Publisher for OAuth1Client {
    fn name(&self) -> &'static str {
        "oauth1"
    }

    async fn check_connection(&self) -> Result<PublisherIdentity, PublisherError> {
        let response = self
            .request(Method::GET, "/2/users/me")?
            .send()
            .await
            .map_err(|e| PublisherError::Auth(e.to_string()))?;
        let body = read_json(response, PublisherError::Auth).await?;

        let field = |name: &str| {
            body.pointer(&format!("/data/{}", name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        match (field("id"), field("username")) {
            (Some(id), Some(username)) => Ok(PublisherIdentity {
                name: field("name").unwrap_or_else(|| username.clone()),
                id,
                username,
            }),
            _ => Err(PublisherError::Auth(
                "user lookup returned no identity".to_string(),
            )),
        }
    }

    async fn send_text(&self, text: &str) -> Result<String, PublisherError> {
        let response = self
            .request(Method::POST, "/2/tweets")?
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| PublisherError::Publish(e.to_string()))?;
        let body = read_json(response, PublisherError::Publish).await?;

        body.pointer("/data/id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| PublisherError::Publish("response carried no tweet id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documented_keys() -> OAuth1Credentials {
        OAuth1Credentials {
            api_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            api_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    #[test]
    fn test_signature_matches_published_example() {
        let signer = OAuth1Signer::new(documented_keys());
        let signature = signer
            .sign_with(
                "post",
                "https://api.twitter.com/1.1/statuses/update.json",
                &[
                    ("include_entities", "true"),
                    ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ],
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                "1318622958",
            )
            .unwrap();

        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_header_carries_encoded_signature() {
        let signer = OAuth1Signer::new(documented_keys());
        let header = signer
            .header_with(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json",
                &[
                    ("include_entities", "true"),
                    ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ],
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                "1318622958",
            )
            .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
    }

    #[test]
    fn test_fresh_headers_use_new_nonces() {
        let signer = OAuth1Signer::new(documented_keys());
        let a = signer
            .authorization_header(&Method::GET, "https://api.twitter.com/2/users/me")
            .unwrap();
        let b = signer
            .authorization_header(&Method::GET, "https://api.twitter.com/2/users/me")
            .unwrap();
        assert_ne!(a, b);
    }
}
