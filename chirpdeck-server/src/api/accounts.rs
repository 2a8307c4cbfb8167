use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use chirpdeck_types::{AccountResponse, AccountsResponse, CreateAccountRequest, UpdateAccountRequest};

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::AccountRepository,
    state::AppState,
};

/// GET /accounts - All accounts, newest first
pub async fn list_accounts(State(state): State<AppState>) -> ApiResult<Json<AccountsResponse>> {
    let accounts = AccountRepository::new(&state.db).list()?;
    Ok(Json(AccountsResponse { accounts }))
}

/// POST /accounts - Register an account
pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let Json(req) = payload?;

    let account = AccountRepository::new(&state.db).create(
        req.username.as_deref().unwrap_or_default(),
        req.auth_token.as_deref().unwrap_or_default(),
        req.avatar_url.as_deref(),
    )?;

    tracing::info!("Created account {} ({})", account.id, account.username);
    Ok((StatusCode::CREATED, Json(AccountResponse { account })))
}

/// PUT /accounts - Activate or deactivate an account
pub async fn update_account(
    State(state): State<AppState>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<Json<AccountResponse>> {
    let Json(req) = payload?;

    let id = req
        .id
        .ok_or_else(|| ApiError::BadRequest("Account ID is required".to_string()))?;
    let is_active = req
        .is_active
        .ok_or_else(|| ApiError::BadRequest("isActive is required".to_string()))?;

    let account = AccountRepository::new(&state.db).set_active(id, is_active)?;

    tracing::info!("Account {} active={}", account.id, account.is_active);
    Ok(Json(AccountResponse { account }))
}
