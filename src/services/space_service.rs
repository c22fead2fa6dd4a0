use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Space, SpaceDetail, SpaceIdentity, TaxonomyKind};
use crate::database::store::{CatalogStore, CatalogTx, StoreError};
use crate::services::double_option;
use crate::services::slug::{self, SlugError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpaceRequest {
    pub name: String,
    pub type_id: Uuid,
    pub category_ids: Option<Vec<Uuid>>,
    pub feature_ids: Option<Vec<Uuid>>,
    pub alternate_names: Option<Vec<String>>,
    pub activities: Option<Vec<String>>,
    pub descriptions: Option<String>,
    pub historical_context: Option<String>,
    pub architectural_style: Option<String>,
    pub operating_hours: Option<Value>,
    pub entrance_fee: Option<Value>,
    pub contact_info: Option<Value>,
    pub accessibility: Option<Value>,
}

/// Partial update: absent fields stay untouched. The nullable columns use
/// double-Option so an explicit `null` clears while an absent key leaves.
/// `category_ids`/`feature_ids` follow "set to" semantics: an empty list
/// clears the links of that kind, an absent key changes nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpaceRequest {
    pub name: Option<String>,
    pub type_id: Option<Uuid>,
    pub category_ids: Option<Vec<Uuid>>,
    pub feature_ids: Option<Vec<Uuid>>,
    pub alternate_names: Option<Vec<String>>,
    pub activities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub descriptions: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub historical_context: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub architectural_style: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub operating_hours: Option<Option<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub entrance_fee: Option<Option<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_info: Option<Option<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub accessibility: Option<Option<Value>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    #[error("{0}")]
    Validation(String),
    #[error("Space not found")]
    NotFound,
    #[error("Only the user who submitted a space can modify it")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    LostRace(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SlugError> for SpaceError {
    fn from(err: SlugError) -> Self {
        match err {
            SlugError::Exhausted { base, attempts } => SpaceError::Conflict(format!(
                "Could not allocate a unique slug for '{}' after {} attempts",
                base, attempts
            )),
            SlugError::Store(e) => SpaceError::Store(e),
        }
    }
}

/// Constraint violations hit during the write phase, after validation passed
/// inside the same transaction, are concurrent-writer effects: a slug claimed
/// between probe and insert is a retryable conflict for the caller, a failed
/// foreign key means a referenced row vanished mid-flight.
fn map_space_write(err: StoreError) -> SpaceError {
    match err {
        StoreError::UniqueViolation { ref constraint } if constraint == "spaces_slug_key" => {
            SpaceError::Conflict("Space slug was claimed by a concurrent request".to_string())
        }
        StoreError::ForeignKeyViolation { .. } => SpaceError::Validation(
            "A referenced record was removed while the request was in flight".to_string(),
        ),
        other => SpaceError::Store(other),
    }
}

fn validate_name(name: &str) -> Result<(), SpaceError> {
    if name.is_empty() {
        return Err(SpaceError::Validation(
            "Space name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > 255 {
        return Err(SpaceError::Validation(
            "Space name must be at most 255 characters".to_string(),
        ));
    }
    Ok(())
}

/// Drop repeated ids, keeping first-occurrence order.
fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

async fn check_space_type<T: CatalogTx>(tx: &mut T, type_id: Uuid) -> Result<(), SpaceError> {
    let found = tx
        .taxonomy_ids_present(TaxonomyKind::SpaceType, &[type_id])
        .await?;
    if found.is_empty() {
        return Err(SpaceError::Validation(format!(
            "Space type {} does not exist",
            type_id
        )));
    }
    Ok(())
}

/// Every id must resolve. On failure the error names exactly the ids that
/// did not, not a generic message.
async fn check_taxonomy_set<T: CatalogTx>(
    tx: &mut T,
    kind: TaxonomyKind,
    ids: &[Uuid],
) -> Result<(), SpaceError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found: HashSet<Uuid> = tx.taxonomy_ids_present(kind, ids).await?.into_iter().collect();
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SpaceError::Validation(format!(
            "Unknown {} ids: {}",
            kind.label().to_lowercase(),
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Coordinates the space lifecycle. Every mutating operation is one store
/// transaction: reference validation, the row write and the association
/// sync all see the same snapshot and land or vanish together. Reads skip
/// the transaction machinery entirely.
pub struct SpaceService<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> Clone for SpaceService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: CatalogStore> SpaceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        requester_id: Uuid,
        req: CreateSpaceRequest,
    ) -> Result<SpaceIdentity, SpaceError> {
        validate_name(&req.name)?;

        let category_ids = req.category_ids.map(dedup_ids);
        let feature_ids = req.feature_ids.map(dedup_ids);

        let mut tx = self.store.begin().await?;

        check_space_type(&mut tx, req.type_id).await?;
        if let Some(ids) = &category_ids {
            check_taxonomy_set(&mut tx, TaxonomyKind::Category, ids).await?;
        }
        if let Some(ids) = &feature_ids {
            check_taxonomy_set(&mut tx, TaxonomyKind::Feature, ids).await?;
        }

        let slug = slug::unique_slug(&mut tx, &req.name).await?;
        let now = Utc::now();
        let space = Space {
            id: Uuid::new_v4(),
            name: req.name,
            slug,
            alternate_names: req.alternate_names.unwrap_or_default(),
            activities: req.activities.unwrap_or_default(),
            descriptions: req.descriptions,
            historical_context: req.historical_context,
            architectural_style: req.architectural_style,
            operating_hours: req.operating_hours,
            entrance_fee: req.entrance_fee,
            contact_info: req.contact_info,
            accessibility: req.accessibility,
            submitted_by: requester_id,
            type_id: req.type_id,
            created_at: now,
            updated_at: now,
        };

        tx.insert_space(&space).await.map_err(map_space_write)?;
        if let Some(ids) = &category_ids {
            tx.set_space_categories(space.id, ids).await.map_err(map_space_write)?;
        }
        if let Some(ids) = &feature_ids {
            tx.set_space_features(space.id, ids).await.map_err(map_space_write)?;
        }

        tx.commit().await?;

        Ok(SpaceIdentity {
            id: space.id,
            slug: space.slug,
        })
    }

    pub async fn update(
        &self,
        requester_id: Uuid,
        space_id: Uuid,
        req: UpdateSpaceRequest,
    ) -> Result<SpaceDetail, SpaceError> {
        if let Some(name) = &req.name {
            validate_name(name)?;
        }

        let category_ids = req.category_ids.map(dedup_ids);
        let feature_ids = req.feature_ids.map(dedup_ids);

        let mut tx = self.store.begin().await?;

        // Existence before ownership: a non-owner learns a space exists,
        // never that it merely moved
        let mut space = tx.get_space(space_id).await?.ok_or(SpaceError::NotFound)?;
        if space.submitted_by != requester_id {
            return Err(SpaceError::Forbidden);
        }

        if let Some(name) = req.name {
            if name != space.name {
                space.slug = slug::unique_slug(&mut tx, &name).await?;
                space.name = name;
            }
        }

        if let Some(type_id) = req.type_id {
            if type_id != space.type_id {
                check_space_type(&mut tx, type_id).await?;
                space.type_id = type_id;
            }
        }

        if let Some(ids) = &category_ids {
            check_taxonomy_set(&mut tx, TaxonomyKind::Category, ids).await?;
        }
        if let Some(ids) = &feature_ids {
            check_taxonomy_set(&mut tx, TaxonomyKind::Feature, ids).await?;
        }

        if let Some(v) = req.alternate_names {
            space.alternate_names = v;
        }
        if let Some(v) = req.activities {
            space.activities = v;
        }
        if let Some(v) = req.descriptions {
            space.descriptions = v;
        }
        if let Some(v) = req.historical_context {
            space.historical_context = v;
        }
        if let Some(v) = req.architectural_style {
            space.architectural_style = v;
        }
        if let Some(v) = req.operating_hours {
            space.operating_hours = v;
        }
        if let Some(v) = req.entrance_fee {
            space.entrance_fee = v;
        }
        if let Some(v) = req.contact_info {
            space.contact_info = v;
        }
        if let Some(v) = req.accessibility {
            space.accessibility = v;
        }

        space.updated_at = Utc::now();
        let affected = tx.update_space(&space).await.map_err(map_space_write)?;
        if affected == 0 {
            return Err(SpaceError::LostRace("space row vanished during update"));
        }

        if let Some(ids) = &category_ids {
            tx.set_space_categories(space.id, ids).await.map_err(map_space_write)?;
        }
        if let Some(ids) = &feature_ids {
            tx.set_space_features(space.id, ids).await.map_err(map_space_write)?;
        }

        let detail = tx
            .get_space_detail(space.id)
            .await?
            .ok_or(SpaceError::LostRace("updated space vanished before read-back"))?;

        tx.commit().await?;
        Ok(detail)
    }

    pub async fn delete(
        &self,
        requester_id: Uuid,
        space_id: Uuid,
    ) -> Result<SpaceIdentity, SpaceError> {
        let mut tx = self.store.begin().await?;

        let space = tx.get_space(space_id).await?.ok_or(SpaceError::NotFound)?;
        if space.submitted_by != requester_id {
            return Err(SpaceError::Forbidden);
        }

        // Association rows go with the space via FK cascade
        let affected = tx.delete_space(space_id).await?;
        if affected == 0 {
            return Err(SpaceError::LostRace("space row vanished during delete"));
        }

        tx.commit().await?;

        Ok(SpaceIdentity {
            id: space.id,
            slug: space.slug,
        })
    }

    /// Resolve by id when the segment parses as a UUID, otherwise by slug.
    pub async fn get(&self, id_or_slug: &str) -> Result<SpaceDetail, SpaceError> {
        let detail = match Uuid::parse_str(id_or_slug) {
            Ok(id) => self.store.space_detail_by_id(id).await?,
            Err(_) => self.store.space_detail_by_slug(id_or_slug).await?,
        };
        detail.ok_or(SpaceError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<SpaceDetail>, SpaceError> {
        Ok(self.store.list_space_details().await?)
    }
}
