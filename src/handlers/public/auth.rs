use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::database::models::UserProfile;
use crate::database::CatalogStore;
use crate::handlers::parse_body;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::user_service::{LoginRequest, LoginResponse, RegisterRequest};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<UserProfile> {
    let req: RegisterRequest = parse_body(body)?;
    let profile = state.users.register(req).await?;
    Ok(ApiResponse::created(profile))
}

/// POST /api/auth/login
pub async fn login<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<LoginResponse> {
    let req: LoginRequest = parse_body(body)?;
    let response = state.users.login(req).await?;
    Ok(ApiResponse::success(response))
}
