//! Platform-database persistence.
//!
//! The service registry row is host-owned; this store carries it so the
//! plugin runs self-contained, and owns the `sql_db_config` row outright.
//! Config rows are never deleted directly: the foreign-key cascade removes
//! them with their service.

use crate::config::SqlDbConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// One row of the host service registry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceRecord {
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(rename = "type")]
    pub service_type: String,
    pub created_at: DateTime<Utc>,
}

/// Registration payload for a new service.
#[derive(Debug, Clone, Deserialize)]
pub struct NewService {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active", deserialize_with = "portico_core::de::flexible_bool")]
    pub is_active: bool,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub config: Option<SqlDbConfig>,
}

fn default_active() -> bool {
    true
}

/// Store over the platform database.
#[derive(Clone)]
pub struct ConfigStore {
    pool: PgPool,
}

impl ConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the registry and config-table migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Register a service and, when supplied, its connection config.
    pub async fn create_service(&self, service: &NewService) -> Result<ServiceRecord, StoreError> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            r#"
            insert into service (name, label, description, is_active, service_type)
            values ($1, $2, $3, $4, $5)
            returning id, name, label, description, is_active, service_type, created_at
            "#,
        )
        .bind(&service.name)
        .bind(&service.label)
        .bind(&service.description)
        .bind(service.is_active)
        .bind(&service.service_type)
        .fetch_one(&self.pool)
        .await?;

        if let Some(config) = &service.config {
            self.upsert_config(record.id, config).await?;
        }

        tracing::info!(id = record.id, name = %record.name, "service registered");
        Ok(record)
    }

    pub async fn get_service(&self, id: i32) -> Result<Option<ServiceRecord>, StoreError> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            r#"
            select id, name, label, description, is_active, service_type, created_at
            from service where id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<ServiceRecord>, StoreError> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            r#"
            select id, name, label, description, is_active, service_type, created_at
            from service where name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// List services, optionally restricted to the given ids.
    pub async fn list_services(&self, ids: Option<&[i32]>) -> Result<Vec<ServiceRecord>, StoreError> {
        let records = match ids {
            Some(ids) => {
                sqlx::query_as::<_, ServiceRecord>(
                    r#"
                    select id, name, label, description, is_active, service_type, created_at
                    from service where id = any($1) order by id
                    "#,
                )
                .bind(ids)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ServiceRecord>(
                    r#"
                    select id, name, label, description, is_active, service_type, created_at
                    from service order by id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(records)
    }

    /// Delete a service; the cascade removes its config row.
    pub async fn delete_service(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("delete from service where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::info!(id, "service deleted");
        Ok(())
    }

    pub async fn get_config(&self, service_id: i32) -> Result<Option<SqlDbConfig>, StoreError> {
        let config = sqlx::query_as::<_, SqlDbConfig>(
            r#"
            select dsn, username, password, db, options, attributes
            from sql_db_config where service_id = $1
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(config)
    }

    pub async fn upsert_config(
        &self,
        service_id: i32,
        config: &SqlDbConfig,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            insert into sql_db_config (service_id, dsn, username, password, db, options, attributes)
            values ($1, $2, $3, $4, $5, $6, $7)
            on conflict (service_id) do update set
                dsn = excluded.dsn,
                username = excluded.username,
                password = excluded.password,
                db = excluded.db,
                options = excluded.options,
                attributes = excluded.attributes
            "#,
        )
        .bind(service_id)
        .bind(&config.dsn)
        .bind(&config.username)
        .bind(&config.password)
        .bind(&config.db)
        .bind(&config.options)
        .bind(&config.attributes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
