use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{Space, SpaceDetail, TaxonomyEntry, TaxonomyKind, User};
use super::store::{CatalogStore, CatalogTx, StoreError};

/// In-process implementation of [`CatalogStore`], used by the test suites.
///
/// Transactions take a snapshot of the whole state at `begin`; `commit`
/// publishes the snapshot wholesale and dropping the transaction discards it.
/// Constraint checks mirror the migration DDL, including constraint names,
/// so services observe the same `StoreError`s they would get from Postgres.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    space_types: HashMap<Uuid, TaxonomyEntry>,
    categories: HashMap<Uuid, TaxonomyEntry>,
    features: HashMap<Uuid, TaxonomyEntry>,
    spaces: HashMap<Uuid, Space>,
    space_categories: HashSet<(Uuid, Uuid)>,
    space_features: HashSet<(Uuid, Uuid)>,
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

impl MemoryState {
    fn taxonomy(&self, kind: TaxonomyKind) -> &HashMap<Uuid, TaxonomyEntry> {
        match kind {
            TaxonomyKind::SpaceType => &self.space_types,
            TaxonomyKind::Category => &self.categories,
            TaxonomyKind::Feature => &self.features,
        }
    }

    fn taxonomy_mut(&mut self, kind: TaxonomyKind) -> &mut HashMap<Uuid, TaxonomyEntry> {
        match kind {
            TaxonomyKind::SpaceType => &mut self.space_types,
            TaxonomyKind::Category => &mut self.categories,
            TaxonomyKind::Feature => &mut self.features,
        }
    }

    fn create_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.users.values().any(|u| u.username == user.username) {
            return Err(unique("users_username_key"));
        }
        if self.users.values().any(|u| u.email == user.email) {
            return Err(unique("users_email_key"));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn create_taxonomy(&mut self, kind: TaxonomyKind, entry: &TaxonomyEntry) -> Result<(), StoreError> {
        if self.taxonomy(kind).values().any(|e| e.name == entry.name) {
            return Err(unique(kind.name_key()));
        }
        self.taxonomy_mut(kind).insert(entry.id, entry.clone());
        Ok(())
    }

    fn update_taxonomy(&mut self, kind: TaxonomyKind, entry: &TaxonomyEntry) -> Result<u64, StoreError> {
        if !self.taxonomy(kind).contains_key(&entry.id) {
            return Ok(0);
        }
        if self
            .taxonomy(kind)
            .values()
            .any(|e| e.id != entry.id && e.name == entry.name)
        {
            return Err(unique(kind.name_key()));
        }
        self.taxonomy_mut(kind).insert(entry.id, entry.clone());
        Ok(1)
    }

    fn delete_taxonomy(&mut self, kind: TaxonomyKind, id: Uuid) -> u64 {
        if self.taxonomy_mut(kind).remove(&id).is_none() {
            return 0;
        }
        match kind {
            TaxonomyKind::Category => {
                self.space_categories.retain(|(_, cid)| *cid != id);
            }
            TaxonomyKind::Feature => {
                self.space_features.retain(|(_, fid)| *fid != id);
            }
            TaxonomyKind::SpaceType => {
                // spaces.type_id is ON DELETE CASCADE, so the spaces go too
                let doomed: Vec<Uuid> = self
                    .spaces
                    .values()
                    .filter(|s| s.type_id == id)
                    .map(|s| s.id)
                    .collect();
                for space_id in doomed {
                    self.delete_space(space_id);
                }
            }
        }
        1
    }

    fn insert_space(&mut self, space: &Space) -> Result<(), StoreError> {
        if self.spaces.contains_key(&space.id) {
            return Err(unique("spaces_pkey"));
        }
        if self.spaces.values().any(|s| s.slug == space.slug) {
            return Err(unique("spaces_slug_key"));
        }
        if !self.users.contains_key(&space.submitted_by) {
            return Err(foreign_key("spaces_submitted_by_fkey"));
        }
        if !self.space_types.contains_key(&space.type_id) {
            return Err(foreign_key("spaces_type_id_fkey"));
        }
        self.spaces.insert(space.id, space.clone());
        Ok(())
    }

    fn update_space(&mut self, space: &Space) -> Result<u64, StoreError> {
        if !self.spaces.contains_key(&space.id) {
            return Ok(0);
        }
        if self
            .spaces
            .values()
            .any(|s| s.id != space.id && s.slug == space.slug)
        {
            return Err(unique("spaces_slug_key"));
        }
        if !self.space_types.contains_key(&space.type_id) {
            return Err(foreign_key("spaces_type_id_fkey"));
        }
        self.spaces.insert(space.id, space.clone());
        Ok(1)
    }

    fn delete_space(&mut self, id: Uuid) -> u64 {
        if self.spaces.remove(&id).is_none() {
            return 0;
        }
        self.space_categories.retain(|(sid, _)| *sid != id);
        self.space_features.retain(|(sid, _)| *sid != id);
        1
    }

    fn set_space_categories(&mut self, space_id: Uuid, ids: &[Uuid]) -> Result<(), StoreError> {
        if !self.spaces.contains_key(&space_id) {
            return Err(foreign_key("space_categories_space_id_fkey"));
        }
        if ids.iter().any(|id| !self.categories.contains_key(id)) {
            return Err(foreign_key("space_categories_category_id_fkey"));
        }
        self.space_categories.retain(|(sid, _)| *sid != space_id);
        self.space_categories.extend(ids.iter().map(|id| (space_id, *id)));
        Ok(())
    }

    fn set_space_features(&mut self, space_id: Uuid, ids: &[Uuid]) -> Result<(), StoreError> {
        if !self.spaces.contains_key(&space_id) {
            return Err(foreign_key("space_features_space_id_fkey"));
        }
        if ids.iter().any(|id| !self.features.contains_key(id)) {
            return Err(foreign_key("space_features_feature_id_fkey"));
        }
        self.space_features.retain(|(sid, _)| *sid != space_id);
        self.space_features.extend(ids.iter().map(|id| (space_id, *id)));
        Ok(())
    }

    fn space_detail(&self, space: &Space) -> Result<SpaceDetail, StoreError> {
        let type_name = self
            .space_types
            .get(&space.type_id)
            .map(|t| t.name.clone())
            .ok_or_else(|| {
                StoreError::Database(format!(
                    "space {} references missing type {}",
                    space.id, space.type_id
                ))
            })?;

        // Names sorted for stable output
        let mut categories: Vec<String> = self
            .space_categories
            .iter()
            .filter(|(sid, _)| *sid == space.id)
            .filter_map(|(_, cid)| self.categories.get(cid))
            .map(|c| c.name.clone())
            .collect();
        categories.sort();

        let mut features: Vec<String> = self
            .space_features
            .iter()
            .filter(|(sid, _)| *sid == space.id)
            .filter_map(|(_, fid)| self.features.get(fid))
            .map(|f| f.name.clone())
            .collect();
        features.sort();

        Ok(SpaceDetail {
            space: space.clone(),
            type_name,
            categories,
            features,
        })
    }

    fn list_details(&self) -> Result<Vec<SpaceDetail>, StoreError> {
        let mut spaces: Vec<&Space> = self.spaces.values().collect();
        spaces.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        spaces.into_iter().map(|s| self.space_detail(s)).collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let staged = self.state.lock().await.clone();
        Ok(MemoryTx {
            shared: self.state.clone(),
            staged,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn space_detail_by_id(&self, id: Uuid) -> Result<Option<SpaceDetail>, StoreError> {
        let state = self.state.lock().await;
        state.spaces.get(&id).map(|s| state.space_detail(s)).transpose()
    }

    async fn space_detail_by_slug(&self, slug: &str) -> Result<Option<SpaceDetail>, StoreError> {
        let state = self.state.lock().await;
        state
            .spaces
            .values()
            .find(|s| s.slug == slug)
            .map(|s| state.space_detail(s))
            .transpose()
    }

    async fn list_space_details(&self) -> Result<Vec<SpaceDetail>, StoreError> {
        self.state.lock().await.list_details()
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.state.lock().await.create_user(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn user_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, StoreError> {
        let state = self.state.lock().await;
        let mut entries: Vec<TaxonomyEntry> = state.taxonomy(kind).values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn taxonomy_by_id(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
    ) -> Result<Option<TaxonomyEntry>, StoreError> {
        Ok(self.state.lock().await.taxonomy(kind).get(&id).cloned())
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        entry: &TaxonomyEntry,
    ) -> Result<(), StoreError> {
        self.state.lock().await.create_taxonomy(kind, entry)
    }

    async fn update_taxonomy(
        &self,
        kind: TaxonomyKind,
        entry: &TaxonomyEntry,
    ) -> Result<u64, StoreError> {
        self.state.lock().await.update_taxonomy(kind, entry)
    }

    async fn delete_taxonomy(&self, kind: TaxonomyKind, id: Uuid) -> Result<u64, StoreError> {
        Ok(self.state.lock().await.delete_taxonomy(kind, id))
    }
}

/// Snapshot transaction over a [`MemoryStore`].
pub struct MemoryTx {
    shared: Arc<Mutex<MemoryState>>,
    staged: MemoryState,
}

#[async_trait]
impl CatalogTx for MemoryTx {
    async fn commit(self) -> Result<(), StoreError> {
        *self.shared.lock().await = self.staged;
        Ok(())
    }

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.staged.spaces.values().any(|s| s.slug == slug))
    }

    async fn taxonomy_ids_present(
        &mut self,
        kind: TaxonomyKind,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, StoreError> {
        let table = self.staged.taxonomy(kind);
        Ok(ids.iter().copied().filter(|id| table.contains_key(id)).collect())
    }

    async fn get_space(&mut self, id: Uuid) -> Result<Option<Space>, StoreError> {
        Ok(self.staged.spaces.get(&id).cloned())
    }

    async fn get_space_detail(&mut self, id: Uuid) -> Result<Option<SpaceDetail>, StoreError> {
        self.staged
            .spaces
            .get(&id)
            .map(|s| self.staged.space_detail(s))
            .transpose()
    }

    async fn insert_space(&mut self, space: &Space) -> Result<(), StoreError> {
        self.staged.insert_space(space)
    }

    async fn update_space(&mut self, space: &Space) -> Result<u64, StoreError> {
        self.staged.update_space(space)
    }

    async fn delete_space(&mut self, id: Uuid) -> Result<u64, StoreError> {
        Ok(self.staged.delete_space(id))
    }

    async fn set_space_categories(
        &mut self,
        space_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), StoreError> {
        self.staged.set_space_categories(space_id, category_ids)
    }

    async fn set_space_features(
        &mut self,
        space_id: Uuid,
        feature_ids: &[Uuid],
    ) -> Result<(), StoreError> {
        self.staged.set_space_features(space_id, feature_ids)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample_user(username: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.test", username),
            password_hash: "$argon2id$test".to_string(),
            profile_picture: None,
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_entry(name: &str) -> TaxonomyEntry {
        let now = Utc::now();
        TaxonomyEntry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            descriptions: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_space(name: &str, slug: &str, owner: Uuid, type_id: Uuid) -> Space {
        let now = Utc::now();
        Space {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            alternate_names: vec![],
            activities: vec![],
            descriptions: None,
            historical_context: None,
            architectural_style: None,
            operating_hours: None,
            entrance_fee: None,
            contact_info: None,
            accessibility: None,
            submitted_by: owner,
            type_id,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded_store() -> (MemoryStore, Uuid, Uuid) {
        let store = MemoryStore::new();
        let user = sample_user("casey");
        let park = sample_entry("Park");
        store.create_user(&user).await.unwrap();
        store
            .create_taxonomy(TaxonomyKind::SpaceType, &park)
            .await
            .unwrap();
        (store, user.id, park.id)
    }

    #[tokio::test]
    async fn uncommitted_transaction_is_invisible_and_dropped() {
        let (store, owner, type_id) = seeded_store().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_space(&sample_space("A", "a", owner, type_id))
                .await
                .unwrap();
            assert!(tx.slug_exists("a").await.unwrap());
            // no commit
        }

        assert!(store.space_detail_by_slug("a").await.unwrap().is_none());
        assert!(store.list_space_details().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_publishes_all_staged_writes() {
        let (store, owner, type_id) = seeded_store().await;
        let fountain = sample_entry("Fountain");
        store
            .create_taxonomy(TaxonomyKind::Feature, &fountain)
            .await
            .unwrap();

        let space = sample_space("A", "a", owner, type_id);
        let mut tx = store.begin().await.unwrap();
        tx.insert_space(&space).await.unwrap();
        tx.set_space_features(space.id, &[fountain.id]).await.unwrap();
        tx.commit().await.unwrap();

        let detail = store.space_detail_by_id(space.id).await.unwrap().unwrap();
        assert_eq!(detail.type_name, "Park");
        assert_eq!(detail.features, vec!["Fountain".to_string()]);
        assert!(detail.categories.is_empty());
    }

    #[tokio::test]
    async fn duplicate_slug_reports_postgres_constraint_name() {
        let (store, owner, type_id) = seeded_store().await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_space(&sample_space("A", "a", owner, type_id))
            .await
            .unwrap();
        let err = tx
            .insert_space(&sample_space("B", "a", owner, type_id))
            .await
            .unwrap_err();
        match err {
            StoreError::UniqueViolation { constraint } => {
                assert_eq!(constraint, "spaces_slug_key")
            }
            other => panic!("expected unique violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_category_link_is_a_foreign_key_violation() {
        let (store, owner, type_id) = seeded_store().await;

        let space = sample_space("A", "a", owner, type_id);
        let mut tx = store.begin().await.unwrap();
        tx.insert_space(&space).await.unwrap();
        let err = tx
            .set_space_categories(space.id, &[Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn deleting_a_space_type_cascades_to_its_spaces() {
        let (store, owner, type_id) = seeded_store().await;

        let space = sample_space("A", "a", owner, type_id);
        let mut tx = store.begin().await.unwrap();
        tx.insert_space(&space).await.unwrap();
        tx.commit().await.unwrap();

        let affected = store
            .delete_taxonomy(TaxonomyKind::SpaceType, type_id)
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert!(store.space_detail_by_id(space.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_and_email_have_distinct_constraints() {
        let store = MemoryStore::new();
        let casey = sample_user("casey");
        store.create_user(&casey).await.unwrap();

        let mut same_name = sample_user("casey");
        same_name.email = "other@example.test".to_string();
        match store.create_user(&same_name).await.unwrap_err() {
            StoreError::UniqueViolation { constraint } => {
                assert_eq!(constraint, "users_username_key")
            }
            other => panic!("expected unique violation, got {:?}", other),
        }

        let mut same_email = sample_user("riley");
        same_email.email = casey.email.clone();
        match store.create_user(&same_email).await.unwrap_err() {
            StoreError::UniqueViolation { constraint } => {
                assert_eq!(constraint, "users_email_key")
            }
            other => panic!("expected unique violation, got {:?}", other),
        }
    }
}
