use axum::extract::{Path, State};

use crate::database::models::SpaceDetail;
use crate::database::CatalogStore;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/spaces
pub async fn list<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> ApiResult<Vec<SpaceDetail>> {
    let spaces = state.spaces.list().await?;
    Ok(ApiResponse::success(spaces))
}

/// GET /api/spaces/:id
///
/// The segment may be a UUID or a slug, so both canonical links and
/// pretty URLs resolve.
pub async fn get<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id_or_slug): Path<String>,
) -> ApiResult<SpaceDetail> {
    let detail = state.spaces.get(&id_or_slug).await?;
    Ok(ApiResponse::success(detail))
}
