use axum::extract::{Path, State};
use uuid::Uuid;

use crate::database::models::{TaxonomyEntry, TaxonomyKind};
use crate::database::CatalogStore;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

async fn list_kind<S: CatalogStore>(
    state: AppState<S>,
    kind: TaxonomyKind,
) -> ApiResult<Vec<TaxonomyEntry>> {
    let entries = state.taxonomy.list(kind).await?;
    Ok(ApiResponse::success(entries))
}

async fn get_kind<S: CatalogStore>(
    state: AppState<S>,
    kind: TaxonomyKind,
    id: Uuid,
) -> ApiResult<TaxonomyEntry> {
    let entry = state.taxonomy.get(kind, id).await?;
    Ok(ApiResponse::success(entry))
}

/// GET /api/types
pub async fn list_types<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> ApiResult<Vec<TaxonomyEntry>> {
    list_kind(state, TaxonomyKind::SpaceType).await
}

/// GET /api/types/:id
pub async fn get_type<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaxonomyEntry> {
    get_kind(state, TaxonomyKind::SpaceType, id).await
}

/// GET /api/categories
pub async fn list_categories<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> ApiResult<Vec<TaxonomyEntry>> {
    list_kind(state, TaxonomyKind::Category).await
}

/// GET /api/categories/:id
pub async fn get_category<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaxonomyEntry> {
    get_kind(state, TaxonomyKind::Category, id).await
}

/// GET /api/features
pub async fn list_features<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> ApiResult<Vec<TaxonomyEntry>> {
    list_kind(state, TaxonomyKind::Feature).await
}

/// GET /api/features/:id
pub async fn get_feature<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaxonomyEntry> {
    get_kind(state, TaxonomyKind::Feature, id).await
}
