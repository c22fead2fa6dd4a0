use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{SpaceDetail, SpaceIdentity};
use crate::database::CatalogStore;
use crate::handlers::parse_body;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::space_service::{CreateSpaceRequest, UpdateSpaceRequest};
use crate::state::AppState;

/// POST /api/spaces
pub async fn create<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult<SpaceIdentity> {
    let req: CreateSpaceRequest = parse_body(body)?;
    let identity = state.spaces.create(auth.user_id, req).await?;
    Ok(ApiResponse::created(identity))
}

/// PUT /api/spaces/:id
pub async fn update<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<SpaceDetail> {
    let req: UpdateSpaceRequest = parse_body(body)?;
    let detail = state.spaces.update(auth.user_id, id, req).await?;
    Ok(ApiResponse::success(detail))
}

/// DELETE /api/spaces/:id
pub async fn delete<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<SpaceIdentity> {
    let identity = state.spaces.delete(auth.user_id, id).await?;
    Ok(ApiResponse::success(identity))
}
