use serde::{Deserialize, Serialize};

/// Publication state of a scheduled post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    #[default]
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "scheduled" => Some(PostStatus::Scheduled),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, PostStatus::Published)
    }
}

/// Which set of secret fields a stored credential carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Cookie,
    Login,
    #[serde(rename = "oauth1")]
    OAuth1,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Cookie => "cookie",
            CredentialKind::Login => "login",
            CredentialKind::OAuth1 => "oauth1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cookie" => Some(CredentialKind::Cookie),
            "login" => Some(CredentialKind::Login),
            "oauth1" => Some(CredentialKind::OAuth1),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_status_parse() {
        assert_eq!(PostStatus::parse("published"), Some(PostStatus::Published));
        assert_eq!(PostStatus::parse(" Draft "), Some(PostStatus::Draft));
        assert_eq!(PostStatus::parse("failed"), None);
        assert_eq!(PostStatus::default(), PostStatus::Scheduled);
    }

    #[test]
    fn test_credential_kind_serde_names() {
        let json = serde_json::to_string(&CredentialKind::OAuth1).unwrap();
        assert_eq!(json, "\"oauth1\"");
        assert_eq!(CredentialKind::parse("COOKIE"), Some(CredentialKind::Cookie));
    }
}
