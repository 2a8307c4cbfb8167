use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use chirpdeck_types::{LikesResponse, SimulateLikesRequest, SimulatedLikesResponse};

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::{LikeRepository, RECENT_LIKES_LIMIT},
    engagement::{EngagementSimulator, DEFAULT_LIKES_COUNT},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LikesQuery {
    #[serde(rename = "postId")]
    pub post_id: Option<i64>,
}

/// GET /likes - Likes on one post, or the most recent likes overall
pub async fn list_likes(
    State(state): State<AppState>,
    query: Result<Query<LikesQuery>, QueryRejection>,
) -> ApiResult<Json<LikesResponse>> {
    let Query(query) = query?;
    let repo = LikeRepository::new(&state.db);
    let likes = match query.post_id {
        Some(post_id) => repo.list_for_post(post_id)?,
        None => repo.list_recent(RECENT_LIKES_LIMIT)?,
    };

    Ok(Json(LikesResponse { likes }))
}

/// POST /likes - Simulate likes on a post from other active accounts
pub async fn simulate_likes(
    State(state): State<AppState>,
    payload: Result<Json<SimulateLikesRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SimulatedLikesResponse>)> {
    let Json(req) = payload?;

    let post_id = req
        .post_id
        .ok_or_else(|| ApiError::BadRequest("postId is required".to_string()))?;
    let count = req.likes_count.unwrap_or(DEFAULT_LIKES_COUNT);
    let mutual = req.is_mutual.unwrap_or(true);

    let likes = EngagementSimulator::new(&state.db).simulate(post_id, count, mutual)?;

    tracing::info!("Simulated {} likes on post {}", likes.len(), post_id);
    Ok((
        StatusCode::CREATED,
        Json(SimulatedLikesResponse {
            count: likes.len(),
            likes,
        }),
    ))
}
