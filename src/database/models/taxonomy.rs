use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The three reference tables a space links against. They share one row shape,
/// so store operations take the kind and dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    SpaceType,
    Category,
    Feature,
}

impl TaxonomyKind {
    pub fn table(&self) -> &'static str {
        match self {
            TaxonomyKind::SpaceType => "space_types",
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Feature => "features",
        }
    }

    /// Human label used in error messages ("Space type not found").
    pub fn label(&self) -> &'static str {
        match self {
            TaxonomyKind::SpaceType => "Space type",
            TaxonomyKind::Category => "Category",
            TaxonomyKind::Feature => "Feature",
        }
    }

    /// Postgres name of the UNIQUE constraint on `name` for this table.
    pub fn name_key(&self) -> &'static str {
        match self {
            TaxonomyKind::SpaceType => "space_types_name_key",
            TaxonomyKind::Category => "categories_name_key",
            TaxonomyKind::Feature => "features_name_key",
        }
    }
}

/// One row of a taxonomy table. `name` is unique per table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntry {
    pub id: Uuid,
    pub name: String,
    pub descriptions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
