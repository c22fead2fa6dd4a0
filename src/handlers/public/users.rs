use axum::extract::{Path, State};
use uuid::Uuid;

use crate::database::models::PublicUserProfile;
use crate::database::CatalogStore;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/users/:id
pub async fn profile<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<PublicUserProfile> {
    let profile = state.users.public_profile(id).await?;
    Ok(ApiResponse::success(profile))
}
