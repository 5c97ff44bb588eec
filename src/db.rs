//! Read-only corroboration against the portal's relational store.
//!
//! The database is never driven from here. Every query exists to confirm an
//! outcome that was already observed over HTTP, such as an upload record
//! being marked complete after the wizard reported success.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::HarnessResult;

pub struct PortalDatabase {
    pool: PgPool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UploadRecord {
    pub id: i32,
    pub name: String,
    pub complete: bool,
    pub import_id: Option<i32>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkRecord {
    pub url: String,
    pub link_type: String,
    pub name: String,
    pub extension: Option<String>,
    pub mime: Option<String>,
}

impl PortalDatabase {
    pub async fn connect(config: &DatabaseConfig) -> HarnessResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Newest upload record whose name contains the given layer name.
    pub async fn latest_upload(&self, name: &str) -> HarnessResult<Option<UploadRecord>> {
        let record = sqlx::query_as::<_, UploadRecord>(
            r#"
            SELECT id, name, complete, import_id, date
            FROM upload_upload
            WHERE name ILIKE $1
            ORDER BY date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(format!("%{}%", name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Upload records that never reached completion.
    pub async fn pending_uploads(&self) -> HarnessResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM upload_upload WHERE NOT complete")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Number of attributes registered for a vector layer.
    pub async fn layer_attribute_count(&self, layer_name: &str) -> HarnessResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM layers_attribute a
            JOIN layers_layer l ON a.layer_id = l.resourcebase_ptr_id
            WHERE l.name = $1
            "#,
        )
        .bind(layer_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Links of the given types registered for a layer's resource.
    pub async fn resource_links(
        &self,
        layer_name: &str,
        link_types: &[&str],
    ) -> HarnessResult<Vec<LinkRecord>> {
        let types: Vec<String> = link_types.iter().map(|t| t.to_string()).collect();
        let links = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT bl.url, bl.link_type, bl.name, bl.extension, bl.mime
            FROM base_link bl
            JOIN layers_layer l ON bl.resource_id = l.resourcebase_ptr_id
            WHERE l.name = $1 AND bl.link_type = ANY($2)
            "#,
        )
        .bind(layer_name)
        .bind(&types)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }
}
