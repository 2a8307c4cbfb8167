use axum::{extract::rejection::JsonRejection, extract::State, Json};

use chirpdeck_types::{
    CookieCredentialsRequest, CredentialStatus, CredentialsSavedResponse,
    LoginCredentialsRequest, OAuth1CredentialsRequest,
};

use crate::{
    api::{ApiError, ApiResult},
    credentials::Credentials,
    db::repositories::CredentialRepository,
    state::AppState,
};

/// GET /credentials - Which credential fields are stored, never their values
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<CredentialStatus>> {
    let status = CredentialRepository::new(&state.db).status()?;
    Ok(Json(status))
}

fn save(state: &AppState, credentials: Credentials, message: &str) -> ApiResult<Json<CredentialsSavedResponse>> {
    CredentialRepository::new(&state.db).replace(&credentials)?;

    tracing::info!("Replaced stored credentials ({})", credentials.kind().as_str());
    Ok(Json(CredentialsSavedResponse {
        success: true,
        message: message.to_string(),
    }))
}

/// POST /credentials/cookie
pub async fn save_cookie(
    State(state): State<AppState>,
    payload: Result<Json<CookieCredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<CredentialsSavedResponse>> {
    let Json(req) = payload?;
    let credentials = Credentials::cookie(req.auth_token.as_deref(), req.ct0.as_deref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    save(&state, credentials, "Session cookies saved")
}

/// POST /credentials/login
pub async fn save_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginCredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<CredentialsSavedResponse>> {
    let Json(req) = payload?;
    let credentials = Credentials::login(req.username.as_deref(), req.password.as_deref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    save(&state, credentials, "Login credentials saved")
}

/// POST /credentials/oauth1
pub async fn save_oauth1(
    State(state): State<AppState>,
    payload: Result<Json<OAuth1CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<CredentialsSavedResponse>> {
    let Json(req) = payload?;
    let credentials = Credentials::oauth1(
        req.api_key.as_deref(),
        req.api_secret.as_deref(),
        req.access_token.as_deref(),
        req.access_token_secret.as_deref(),
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    save(&state, credentials, "OAuth1 keys saved")
}
