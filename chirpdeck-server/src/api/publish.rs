use axum::{extract::rejection::JsonRejection, extract::State, Json};

use chirpdeck_types::{ConnectionCheckResponse, PostStatus, PublishRequest, PublishResponse};

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::{CredentialRepository, PostRepository},
    publisher::{self, Publisher},
    state::AppState,
};

fn publisher_for(state: &AppState) -> ApiResult<Box<dyn Publisher>> {
    let store = CredentialRepository::new(&state.db);
    let credentials = publisher::resolve_credentials(&state.publisher, &store)?;
    Ok(publisher::build_publisher(&state.publisher, credentials)?)
}

/// GET /publish - Verify the configured credentials against the network
pub async fn check_connection(
    State(state): State<AppState>,
) -> ApiResult<Json<ConnectionCheckResponse>> {
    let client = publisher_for(&state)?;

    let user = client.check_connection().await.map_err(|e| {
        tracing::warn!("Connection check via {} failed: {}", client.name(), e);
        ApiError::from(e)
    })?;

    Ok(Json(ConnectionCheckResponse {
        success: true,
        message: format!("Connected to Twitter as @{}", user.username),
        user,
    }))
}

/// POST /publish - Publish text, marking the linked post published on success
pub async fn publish(
    State(state): State<AppState>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> ApiResult<Json<PublishResponse>> {
    let Json(req) = payload?;
    let client = publisher_for(&state)?;

    let posts = PostRepository::new(&state.db);
    if let Some(post_id) = req.post_id {
        if posts.get(post_id)?.is_none() {
            return Err(ApiError::NotFound("Post not found".to_string()));
        }
    }

    let text = req.text.unwrap_or_default();
    let tweet = client.publish_text(&text).await.map_err(|e| {
        tracing::warn!("Publishing via {} failed: {}", client.name(), e);
        ApiError::from(e)
    })?;
    tracing::info!("Published tweet {} via {}", tweet.id, client.name());

    if let Some(post_id) = req.post_id {
        posts.update_status(post_id, PostStatus::Published, Some(&tweet.id))?;
        tracing::info!("Post {} marked published as {}", post_id, tweet.id);
    }

    Ok(Json(PublishResponse {
        success: true,
        message: "Tweet published".to_string(),
        tweet,
    }))
}
