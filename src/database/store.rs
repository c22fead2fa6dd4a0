use async_trait::async_trait;
use uuid::Uuid;

use super::models::{Space, SpaceDetail, TaxonomyEntry, TaxonomyKind, User};

/// Errors surfaced by a catalog store. Constraint violations keep the
/// constraint name so services can map them to precise client messages;
/// everything else collapses into `Database`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },
    #[error("foreign key constraint {constraint} violated")]
    ForeignKeyViolation { constraint: String },
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or_default().to_string();
            match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    return StoreError::UniqueViolation { constraint };
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return StoreError::ForeignKeyViolation { constraint };
                }
                _ => {}
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Storage contract for the catalog. `PgStore` implements it against Postgres;
/// `MemoryStore` implements the same semantics (including constraint names)
/// in process so services and handlers can be exercised without a database.
///
/// Pool-level methods are single statements and need no transaction. Anything
/// that must be atomic with other statements goes through a [`CatalogTx`].
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    type Tx: CatalogTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Liveness probe for /health.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn space_detail_by_id(&self, id: Uuid) -> Result<Option<SpaceDetail>, StoreError>;
    async fn space_detail_by_slug(&self, slug: &str) -> Result<Option<SpaceDetail>, StoreError>;
    /// All spaces with resolved taxonomy names, newest first.
    async fn list_space_details(&self) -> Result<Vec<SpaceDetail>, StoreError>;

    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Lookup by username or email, whichever matches.
    async fn user_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError>;

    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, StoreError>;
    async fn taxonomy_by_id(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
    ) -> Result<Option<TaxonomyEntry>, StoreError>;
    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        entry: &TaxonomyEntry,
    ) -> Result<(), StoreError>;
    /// Full-row update; returns the number of rows affected (0 when the id is gone).
    async fn update_taxonomy(
        &self,
        kind: TaxonomyKind,
        entry: &TaxonomyEntry,
    ) -> Result<u64, StoreError>;
    /// Deleting a kind that spaces reference cascades the same way the schema does.
    async fn delete_taxonomy(&self, kind: TaxonomyKind, id: Uuid) -> Result<u64, StoreError>;
}

/// One transaction over a [`CatalogStore`]. Dropping a transaction without
/// calling [`commit`](CatalogTx::commit) rolls it back.
#[async_trait]
pub trait CatalogTx: Send {
    async fn commit(self) -> Result<(), StoreError>;

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, StoreError>;
    /// Which of `ids` exist in the given taxonomy table. Callers compute the
    /// set difference to name exactly the missing ids.
    async fn taxonomy_ids_present(
        &mut self,
        kind: TaxonomyKind,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, StoreError>;

    async fn get_space(&mut self, id: Uuid) -> Result<Option<Space>, StoreError>;
    async fn get_space_detail(&mut self, id: Uuid) -> Result<Option<SpaceDetail>, StoreError>;
    async fn insert_space(&mut self, space: &Space) -> Result<(), StoreError>;
    async fn update_space(&mut self, space: &Space) -> Result<u64, StoreError>;
    async fn delete_space(&mut self, id: Uuid) -> Result<u64, StoreError>;

    /// Replace this space's category links with exactly `category_ids`
    /// (delete-then-insert; an empty slice clears them).
    async fn set_space_categories(
        &mut self,
        space_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), StoreError>;
    /// Same policy as [`set_space_categories`](CatalogTx::set_space_categories), for features.
    async fn set_space_features(
        &mut self,
        space_id: Uuid,
        feature_ids: &[Uuid],
    ) -> Result<(), StoreError>;
}
