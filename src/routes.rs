use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::database::CatalogStore;
use crate::handlers::{protected, public};
use crate::state::AppState;

/// Build the full application router over any store implementation.
///
/// Public and protected routes are kept in separate routers so the auth
/// gate can be applied as a route layer to exactly one of them; merging
/// combines per-path method tables, which is how GET /api/spaces stays
/// public while POST on the same path requires a token.
pub fn app<S: CatalogStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health::<S>))
        .merge(public_routes::<S>())
        .merge(protected_routes::<S>())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes<S: CatalogStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/auth/register", post(public::auth::register::<S>))
        .route("/api/auth/login", post(public::auth::login::<S>))
        .route("/api/spaces", get(public::spaces::list::<S>))
        .route("/api/spaces/:id", get(public::spaces::get::<S>))
        .route("/api/types", get(public::taxonomy::list_types::<S>))
        .route("/api/types/:id", get(public::taxonomy::get_type::<S>))
        .route("/api/categories", get(public::taxonomy::list_categories::<S>))
        .route("/api/categories/:id", get(public::taxonomy::get_category::<S>))
        .route("/api/features", get(public::taxonomy::list_features::<S>))
        .route("/api/features/:id", get(public::taxonomy::get_feature::<S>))
        .route("/api/users/:id", get(public::users::profile::<S>))
}

fn protected_routes<S: CatalogStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/auth/me", get(protected::auth::me::<S>))
        .route("/api/spaces", post(protected::spaces::create::<S>))
        .route(
            "/api/spaces/:id",
            put(protected::spaces::update::<S>).delete(protected::spaces::delete::<S>),
        )
        .route("/api/types", post(protected::taxonomy::create_type::<S>))
        .route(
            "/api/types/:id",
            put(protected::taxonomy::update_type::<S>)
                .delete(protected::taxonomy::delete_type::<S>),
        )
        .route("/api/categories", post(protected::taxonomy::create_category::<S>))
        .route(
            "/api/categories/:id",
            put(protected::taxonomy::update_category::<S>)
                .delete(protected::taxonomy::delete_category::<S>),
        )
        .route("/api/features", post(protected::taxonomy::create_feature::<S>))
        .route(
            "/api/features/:id",
            put(protected::taxonomy::update_feature::<S>)
                .delete(protected::taxonomy::delete_feature::<S>),
        )
        .route_layer(middleware::from_fn(crate::middleware::auth::require_auth))
}

async fn root() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Spaces API",
            "version": version,
            "description": "Catalog of community-submitted spaces with taxonomy tagging",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/register, /api/auth/login (public), /api/auth/me (protected)",
                "spaces": "/api/spaces[/:id] (GET public, mutations protected)",
                "types": "/api/types[/:id] (GET public, mutations protected)",
                "categories": "/api/categories[/:id] (GET public, mutations protected)",
                "features": "/api/features[/:id] (GET public, mutations protected)",
                "users": "/api/users/:id (public)",
            }
        }
    }))
}

async fn health<S: CatalogStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
