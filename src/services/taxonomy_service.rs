use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{TaxonomyEntry, TaxonomyKind};
use crate::database::store::{CatalogStore, StoreError};
use crate::services::double_option;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaxonomyRequest {
    pub name: String,
    pub descriptions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaxonomyRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub descriptions: Option<Option<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn validate_name(name: &str) -> Result<(), TaxonomyError> {
    if name.is_empty() {
        return Err(TaxonomyError::Validation(
            "Name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > 255 {
        return Err(TaxonomyError::Validation(
            "Name must be at most 255 characters".to_string(),
        ));
    }
    Ok(())
}

fn map_name_conflict(err: StoreError, kind: TaxonomyKind) -> TaxonomyError {
    match err {
        StoreError::UniqueViolation { ref constraint } if constraint == kind.name_key() => {
            TaxonomyError::Conflict(format!(
                "A {} with this name already exists",
                kind.label().to_lowercase()
            ))
        }
        other => TaxonomyError::Store(other),
    }
}

/// CRUD over the three taxonomy tables. One service handles all of them;
/// the kind picks the table and the messages.
pub struct TaxonomyService<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> Clone for TaxonomyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: CatalogStore> TaxonomyService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, TaxonomyError> {
        Ok(self.store.list_taxonomy(kind).await?)
    }

    pub async fn get(&self, kind: TaxonomyKind, id: Uuid) -> Result<TaxonomyEntry, TaxonomyError> {
        self.store
            .taxonomy_by_id(kind, id)
            .await?
            .ok_or(TaxonomyError::NotFound(kind.label()))
    }

    pub async fn create(
        &self,
        kind: TaxonomyKind,
        req: CreateTaxonomyRequest,
    ) -> Result<TaxonomyEntry, TaxonomyError> {
        validate_name(&req.name)?;

        let now = Utc::now();
        let entry = TaxonomyEntry {
            id: Uuid::new_v4(),
            name: req.name,
            descriptions: req.descriptions,
            created_at: now,
            updated_at: now,
        };

        self.store
            .create_taxonomy(kind, &entry)
            .await
            .map_err(|e| map_name_conflict(e, kind))?;
        Ok(entry)
    }

    pub async fn update(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
        req: UpdateTaxonomyRequest,
    ) -> Result<TaxonomyEntry, TaxonomyError> {
        if let Some(name) = &req.name {
            validate_name(name)?;
        }

        let mut entry = self
            .store
            .taxonomy_by_id(kind, id)
            .await?
            .ok_or(TaxonomyError::NotFound(kind.label()))?;

        if let Some(name) = req.name {
            entry.name = name;
        }
        if let Some(descriptions) = req.descriptions {
            entry.descriptions = descriptions;
        }
        entry.updated_at = Utc::now();

        let affected = self
            .store
            .update_taxonomy(kind, &entry)
            .await
            .map_err(|e| map_name_conflict(e, kind))?;
        if affected == 0 {
            return Err(TaxonomyError::NotFound(kind.label()));
        }
        Ok(entry)
    }

    /// Deleting an entry also drops its links to spaces; deleting a space
    /// type takes the spaces of that type with it.
    pub async fn delete(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
    ) -> Result<TaxonomyEntry, TaxonomyError> {
        let entry = self
            .store
            .taxonomy_by_id(kind, id)
            .await?
            .ok_or(TaxonomyError::NotFound(kind.label()))?;

        let affected = self.store.delete_taxonomy(kind, id).await?;
        if affected == 0 {
            return Err(TaxonomyError::NotFound(kind.label()));
        }
        Ok(entry)
    }
}
