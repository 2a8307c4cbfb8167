use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chirpdeck_types::ErrorResponse;

use crate::db::repositories::RepositoryError;
use crate::publisher::PublisherError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    InternalError(String),
    /// Failure with a short label plus a human-readable explanation
    Explained {
        status: StatusCode,
        error: String,
        message: String,
    },
}

impl ApiError {
    fn explained(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        ApiError::Explained {
            status,
            error: error.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    msg,
                    Some("An unexpected error occurred".to_string()),
                )
            }
            ApiError::Explained {
                status,
                error,
                message,
            } => {
                if status.is_server_error() {
                    tracing::error!("{}: {}", error, message);
                }
                (status, error, Some(message))
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(msg) => ApiError::BadRequest(msg),
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::Duplicate(msg) => ApiError::Conflict(msg),
            RepositoryError::InvalidCredentials(err) => ApiError::BadRequest(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<PublisherError> for ApiError {
    fn from(err: PublisherError) -> Self {
        match err {
            PublisherError::Validation(msg) => {
                ApiError::explained(StatusCode::BAD_REQUEST, &msg, "Post text must not be empty")
            }
            PublisherError::NotConfigured => ApiError::explained(
                StatusCode::BAD_REQUEST,
                "Twitter credentials not configured",
                "Save a cookie pair or all four OAuth1 keys in the credential settings",
            ),
            PublisherError::Auth(msg) => ApiError::explained(
                StatusCode::UNAUTHORIZED,
                "Authentication failed",
                format!("Could not connect to Twitter: {}", msg),
            ),
            PublisherError::Publish(msg) => ApiError::explained(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create tweet",
                format!("Publishing failed: {}", msg),
            ),
            PublisherError::Client(msg) => ApiError::explained(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initialize Twitter client",
                msg,
            ),
            PublisherError::Transport(err) => ApiError::explained(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initialize Twitter client",
                err.to_string(),
            ),
            PublisherError::Storage(err) => err.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialError;

    #[test]
    fn test_repository_errors_map_to_status() {
        let status = |err: RepositoryError| ApiError::from(err).into_response().status();

        assert_eq!(status(RepositoryError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(RepositoryError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(RepositoryError::Duplicate("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(RepositoryError::InvalidCredentials(CredentialError::Missing(vec!["ct0"]))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(RepositoryError::Sqlite(rusqlite::Error::QueryReturnedNoRows)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_publisher_errors_map_to_status() {
        let status = |err: PublisherError| ApiError::from(err).into_response().status();

        assert_eq!(status(PublisherError::NotConfigured), StatusCode::BAD_REQUEST);
        assert_eq!(status(PublisherError::Auth("bad".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(PublisherError::Publish("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(PublisherError::Validation("Text is required".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
