use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::config;

use super::models::{Space, SpaceDetail, TaxonomyEntry, TaxonomyKind, User};
use super::store::{CatalogStore, CatalogTx, StoreError};

const SPACE_COLUMNS: &str = "id, name, slug, alternate_names, activities, descriptions, \
     historical_context, architectural_style, operating_hours, entrance_fee, contact_info, \
     accessibility, submitted_by, type_id, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, username, email, password_hash, profile_picture, bio, created_at, updated_at";

const TAXONOMY_COLUMNS: &str = "id, name, descriptions, created_at, updated_at";

/// One query shape serves all `SpaceDetail` reads. The double LEFT JOIN
/// multiplies rows, hence the DISTINCT aggregation; NULLs from unmatched
/// joins are stripped so spaces without links get empty arrays.
fn detail_query(where_clause: &str, order_clause: &str) -> String {
    format!(
        "SELECT s.id, s.name, s.slug, s.alternate_names, s.activities, s.descriptions, \
         s.historical_context, s.architectural_style, s.operating_hours, s.entrance_fee, \
         s.contact_info, s.accessibility, s.submitted_by, s.type_id, s.created_at, s.updated_at, \
         t.name AS type_name, \
         COALESCE(array_remove(array_agg(DISTINCT c.name), NULL), ARRAY[]::text[]) AS categories, \
         COALESCE(array_remove(array_agg(DISTINCT f.name), NULL), ARRAY[]::text[]) AS features \
         FROM spaces s \
         JOIN space_types t ON t.id = s.type_id \
         LEFT JOIN space_categories sc ON sc.space_id = s.id \
         LEFT JOIN categories c ON c.id = sc.category_id \
         LEFT JOIN space_features sf ON sf.space_id = s.id \
         LEFT JOIN features f ON f.id = sf.feature_id \
         {} GROUP BY s.id, t.name{}",
        where_clause, order_clause
    )
}

/// Postgres-backed catalog store. Schema migrations are embedded and applied
/// on connect, so a fresh database is usable immediately.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db = &config::config().database;

        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .acquire_timeout(Duration::from_secs(db.connect_timeout_secs))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn space_detail_by_id(&self, id: Uuid) -> Result<Option<SpaceDetail>, StoreError> {
        let detail = sqlx::query_as::<_, SpaceDetail>(&detail_query("WHERE s.id = $1", ""))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(detail)
    }

    async fn space_detail_by_slug(&self, slug: &str) -> Result<Option<SpaceDetail>, StoreError> {
        let detail = sqlx::query_as::<_, SpaceDetail>(&detail_query("WHERE s.slug = $1", ""))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(detail)
    }

    async fn list_space_details(&self) -> Result<Vec<SpaceDetail>, StoreError> {
        let details =
            sqlx::query_as::<_, SpaceDetail>(&detail_query("", " ORDER BY s.created_at DESC"))
                .fetch_all(&self.pool)
                .await?;
        Ok(details)
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, profile_picture, bio, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile_picture)
        .bind(&user.bio)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn user_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $1",
            USER_COLUMNS
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, StoreError> {
        let entries = sqlx::query_as::<_, TaxonomyEntry>(&format!(
            "SELECT {} FROM {} ORDER BY name",
            TAXONOMY_COLUMNS,
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn taxonomy_by_id(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
    ) -> Result<Option<TaxonomyEntry>, StoreError> {
        let entry = sqlx::query_as::<_, TaxonomyEntry>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            TAXONOMY_COLUMNS,
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        entry: &TaxonomyEntry,
    ) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO {} (id, name, descriptions, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
            kind.table()
        ))
        .bind(entry.id)
        .bind(&entry.name)
        .bind(&entry.descriptions)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_taxonomy(
        &self,
        kind: TaxonomyKind,
        entry: &TaxonomyEntry,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET name = $2, descriptions = $3, updated_at = $4 WHERE id = $1",
            kind.table()
        ))
        .bind(entry.id)
        .bind(&entry.name)
        .bind(&entry.descriptions)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_taxonomy(&self, kind: TaxonomyKind, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// A live Postgres transaction. Dropping it without commit rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogTx for PgTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM spaces WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn taxonomy_ids_present(
        &mut self,
        kind: TaxonomyKind,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, StoreError> {
        let found: Vec<Uuid> =
            sqlx::query_scalar(&format!("SELECT id FROM {} WHERE id = ANY($1)", kind.table()))
                .bind(ids)
                .fetch_all(&mut *self.tx)
                .await?;
        Ok(found)
    }

    async fn get_space(&mut self, id: Uuid) -> Result<Option<Space>, StoreError> {
        let space = sqlx::query_as::<_, Space>(&format!(
            "SELECT {} FROM spaces WHERE id = $1",
            SPACE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(space)
    }

    async fn get_space_detail(&mut self, id: Uuid) -> Result<Option<SpaceDetail>, StoreError> {
        let detail = sqlx::query_as::<_, SpaceDetail>(&detail_query("WHERE s.id = $1", ""))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(detail)
    }

    async fn insert_space(&mut self, space: &Space) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO spaces ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
            SPACE_COLUMNS
        ))
        .bind(space.id)
        .bind(&space.name)
        .bind(&space.slug)
        .bind(&space.alternate_names)
        .bind(&space.activities)
        .bind(&space.descriptions)
        .bind(&space.historical_context)
        .bind(&space.architectural_style)
        .bind(&space.operating_hours)
        .bind(&space.entrance_fee)
        .bind(&space.contact_info)
        .bind(&space.accessibility)
        .bind(space.submitted_by)
        .bind(space.type_id)
        .bind(space.created_at)
        .bind(space.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_space(&mut self, space: &Space) -> Result<u64, StoreError> {
        // submitted_by and created_at are immutable after insert
        let result = sqlx::query(
            "UPDATE spaces SET name = $2, slug = $3, alternate_names = $4, activities = $5, \
             descriptions = $6, historical_context = $7, architectural_style = $8, \
             operating_hours = $9, entrance_fee = $10, contact_info = $11, accessibility = $12, \
             type_id = $13, updated_at = $14 WHERE id = $1",
        )
        .bind(space.id)
        .bind(&space.name)
        .bind(&space.slug)
        .bind(&space.alternate_names)
        .bind(&space.activities)
        .bind(&space.descriptions)
        .bind(&space.historical_context)
        .bind(&space.architectural_style)
        .bind(&space.operating_hours)
        .bind(&space.entrance_fee)
        .bind(&space.contact_info)
        .bind(&space.accessibility)
        .bind(space.type_id)
        .bind(space.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_space(&mut self, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM spaces WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_space_categories(
        &mut self,
        space_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM space_categories WHERE space_id = $1")
            .bind(space_id)
            .execute(&mut *self.tx)
            .await?;

        if !category_ids.is_empty() {
            sqlx::query(
                "INSERT INTO space_categories (space_id, category_id) \
                 SELECT $1, unnest($2::uuid[])",
            )
            .bind(space_id)
            .bind(category_ids)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn set_space_features(
        &mut self,
        space_id: Uuid,
        feature_ids: &[Uuid],
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM space_features WHERE space_id = $1")
            .bind(space_id)
            .execute(&mut *self.tx)
            .await?;

        if !feature_ids.is_empty() {
            sqlx::query(
                "INSERT INTO space_features (space_id, feature_id) \
                 SELECT $1, unnest($2::uuid[])",
            )
            .bind(space_id)
            .bind(feature_ids)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }
}
