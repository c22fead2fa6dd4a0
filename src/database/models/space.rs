use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A cataloged place of interest, exactly as stored in the `spaces` table.
///
/// `slug` is globally unique and only regenerated when `name` changes.
/// The four `Value` fields are opaque JSONB documents owned by clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub alternate_names: Vec<String>,
    pub activities: Vec<String>,
    pub descriptions: Option<String>,
    pub historical_context: Option<String>,
    pub architectural_style: Option<String>,
    pub operating_hours: Option<Value>,
    pub entrance_fee: Option<Value>,
    pub contact_info: Option<Value>,
    pub accessibility: Option<Value>,
    pub submitted_by: Uuid,
    pub type_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A space joined with its resolved taxonomy names, the shape read endpoints return.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub space: Space,
    pub type_name: String,
    pub categories: Vec<String>,
    pub features: Vec<String>,
}

/// The minimal handle returned by create/delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceIdentity {
    pub id: Uuid,
    pub slug: String,
}
