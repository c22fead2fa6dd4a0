use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{TaxonomyEntry, TaxonomyKind};
use crate::database::CatalogStore;
use crate::handlers::parse_body;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::taxonomy_service::{CreateTaxonomyRequest, UpdateTaxonomyRequest};
use crate::state::AppState;

// Taxonomy writes require a valid token but not ownership; entries are
// shared vocabulary, not user content.

async fn create_kind<S: CatalogStore>(
    state: AppState<S>,
    kind: TaxonomyKind,
    body: Value,
) -> ApiResult<TaxonomyEntry> {
    let req: CreateTaxonomyRequest = parse_body(body)?;
    let entry = state.taxonomy.create(kind, req).await?;
    Ok(ApiResponse::created(entry))
}

async fn update_kind<S: CatalogStore>(
    state: AppState<S>,
    kind: TaxonomyKind,
    id: Uuid,
    body: Value,
) -> ApiResult<TaxonomyEntry> {
    let req: UpdateTaxonomyRequest = parse_body(body)?;
    let entry = state.taxonomy.update(kind, id, req).await?;
    Ok(ApiResponse::success(entry))
}

async fn delete_kind<S: CatalogStore>(
    state: AppState<S>,
    kind: TaxonomyKind,
    id: Uuid,
) -> ApiResult<TaxonomyEntry> {
    let entry = state.taxonomy.delete(kind, id).await?;
    Ok(ApiResponse::success(entry))
}

/// POST /api/types
pub async fn create_type<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<TaxonomyEntry> {
    create_kind(state, TaxonomyKind::SpaceType, body).await
}

/// PUT /api/types/:id
pub async fn update_type<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<TaxonomyEntry> {
    update_kind(state, TaxonomyKind::SpaceType, id, body).await
}

/// DELETE /api/types/:id
///
/// Spaces of the deleted type are removed with it.
pub async fn delete_type<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaxonomyEntry> {
    delete_kind(state, TaxonomyKind::SpaceType, id).await
}

/// POST /api/categories
pub async fn create_category<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<TaxonomyEntry> {
    create_kind(state, TaxonomyKind::Category, body).await
}

/// PUT /api/categories/:id
pub async fn update_category<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<TaxonomyEntry> {
    update_kind(state, TaxonomyKind::Category, id, body).await
}

/// DELETE /api/categories/:id
pub async fn delete_category<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaxonomyEntry> {
    delete_kind(state, TaxonomyKind::Category, id).await
}

/// POST /api/features
pub async fn create_feature<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<TaxonomyEntry> {
    create_kind(state, TaxonomyKind::Feature, body).await
}

/// PUT /api/features/:id
pub async fn update_feature<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<TaxonomyEntry> {
    update_kind(state, TaxonomyKind::Feature, id, body).await
}

/// DELETE /api/features/:id
pub async fn delete_feature<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaxonomyEntry> {
    delete_kind(state, TaxonomyKind::Feature, id).await
}
