use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use chirpdeck_types::{
    CreatePostRequest, PostResponse, PostStatus, PostsResponse, UpdatePostStatusRequest,
};

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::{NewPost, PostRepository},
    db::timestamp,
    state::AppState,
};

/// GET /posts - All posts, latest scheduled first
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<PostsResponse>> {
    let posts = PostRepository::new(&state.db).list()?;
    Ok(Json(PostsResponse { posts }))
}

/// POST /posts - Schedule a post
pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    let Json(req) = payload?;

    let (Some(content), Some(raw_time)) = (req.content, req.scheduled_time) else {
        return Err(ApiError::BadRequest(
            "Content and scheduledTime are required".to_string(),
        ));
    };
    let scheduled_time = timestamp::parse_client(&raw_time).ok_or_else(|| {
        ApiError::BadRequest(format!("scheduledTime is not a valid timestamp: {}", raw_time))
    })?;

    let post = PostRepository::new(&state.db).create(&NewPost {
        account_id: req.account_id,
        content,
        video_url: req.video_url,
        video_name: req.video_name,
        scheduled_time,
    })?;

    tracing::info!("Scheduled post {} for {}", post.id, post.scheduled_time);
    Ok((StatusCode::CREATED, Json(PostResponse { post })))
}

/// PUT /posts - Change a post's status
pub async fn update_post_status(
    State(state): State<AppState>,
    payload: Result<Json<UpdatePostStatusRequest>, JsonRejection>,
) -> ApiResult<Json<PostResponse>> {
    let Json(req) = payload?;

    let id = req
        .id
        .ok_or_else(|| ApiError::BadRequest("Post ID is required".to_string()))?;
    let raw_status = req
        .status
        .ok_or_else(|| ApiError::BadRequest("status is required".to_string()))?;
    let status = PostStatus::parse(&raw_status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", raw_status)))?;

    let post = PostRepository::new(&state.db).update_status(
        id,
        status,
        req.twitter_post_id.as_deref(),
    )?;

    tracing::info!("Post {} is now {}", post.id, post.status.as_str());
    Ok(Json(PostResponse { post }))
}
