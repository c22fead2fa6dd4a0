use std::sync::Arc;

use crate::database::CatalogStore;
use crate::services::space_service::SpaceService;
use crate::services::taxonomy_service::TaxonomyService;
use crate::services::user_service::UserService;

/// Shared application state: one store, one service per resource family.
/// Generic over the store so the same router runs against Postgres in
/// production and the in-memory store in tests.
pub struct AppState<S: CatalogStore> {
    pub spaces: SpaceService<S>,
    pub taxonomy: TaxonomyService<S>,
    pub users: UserService<S>,
    pub store: Arc<S>,
}

impl<S: CatalogStore> AppState<S> {
    pub fn new(store: S) -> Self {
        let store = Arc::new(store);
        Self {
            spaces: SpaceService::new(store.clone()),
            taxonomy: TaxonomyService::new(store.clone()),
            users: UserService::new(store.clone()),
            store,
        }
    }
}

impl<S: CatalogStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            spaces: self.spaces.clone(),
            taxonomy: self.taxonomy.clone(),
            users: self.users.clone(),
            store: self.store.clone(),
        }
    }
}
