use axum::extract::State;
use axum::Extension;

use crate::database::models::UserProfile;
use crate::database::CatalogStore;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/auth/me
///
/// Returns the account behind the token, fresh from the store rather than
/// echoing claims.
pub async fn me<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    let profile = state.users.me(auth.user_id).await?;
    Ok(ApiResponse::success(profile))
}
