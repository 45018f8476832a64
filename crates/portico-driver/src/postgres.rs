//! PostgreSQL driver.
//!
//! Catalog introspection reads `information_schema` and excludes system
//! schemas (pg_catalog, information_schema). Names from the default
//! `public` schema are reported unqualified; everything else is
//! `schema.name`.

use crate::family::DriverFamily;
use crate::{ColumnDescription, DbDriver, DriverError, TableDescription};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::sync::RwLock;

const POOL_SIZE: u32 = 5;

pub struct PostgresDriver {
    connect_options: PgConnectOptions,
    pool: RwLock<Option<PgPool>>,
    attributes: RwLock<BTreeMap<String, String>>,
    catalog_cache: RwLock<Option<Vec<String>>>,
}

impl PostgresDriver {
    /// Open a connection, folding connection-level options into the
    /// server session settings.
    pub async fn open(
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
        options: &BTreeMap<String, String>,
    ) -> Result<Self, DriverError> {
        let mut connect_options = dsn
            .parse::<PgConnectOptions>()
            .map_err(|e| DriverError::InvalidDsn(e.to_string()))?;
        if let Some(username) = username {
            connect_options = connect_options.username(username);
        }
        if let Some(password) = password {
            connect_options = connect_options.password(password);
        }
        if !options.is_empty() {
            connect_options =
                connect_options.options(options.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let driver = Self {
            connect_options,
            pool: RwLock::new(None),
            attributes: RwLock::new(BTreeMap::new()),
            catalog_cache: RwLock::new(None),
        };
        driver.set_active(true).await?;
        Ok(driver)
    }

    fn pool(&self) -> Result<PgPool, DriverError> {
        self.pool
            .read()
            .unwrap()
            .clone()
            .filter(|pool| !pool.is_closed())
            .ok_or_else(|| DriverError::Connect("connection is not active".into()))
    }
}

fn qualify(schema: &str, name: &str) -> String {
    if schema == "public" {
        name.to_string()
    } else {
        format!("{schema}.{name}")
    }
}

#[async_trait]
impl DbDriver for PostgresDriver {
    fn family(&self) -> DriverFamily {
        DriverFamily::Postgres
    }

    fn set_attribute(&self, key: &str, value: &str) {
        tracing::debug!(key, value, "setting driver attribute");
        self.attributes
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.read().unwrap().get(key).cloned()
    }

    fn is_active(&self) -> bool {
        self.pool
            .read()
            .unwrap()
            .as_ref()
            .is_some_and(|pool| !pool.is_closed())
    }

    async fn set_active(&self, active: bool) -> Result<(), DriverError> {
        if active {
            if self.is_active() {
                return Ok(());
            }
            let pool = PgPoolOptions::new()
                .max_connections(POOL_SIZE)
                .connect_with(self.connect_options.clone())
                .await
                .map_err(|e| DriverError::Connect(e.to_string()))?;
            *self.pool.write().unwrap() = Some(pool);
            Ok(())
        } else {
            let pool = self.pool.write().unwrap().take();
            if let Some(pool) = pool {
                pool.close().await;
            }
            *self.catalog_cache.write().unwrap() = None;
            Ok(())
        }
    }

    async fn list_schemas_and_tables(&self, refresh: bool) -> Result<Vec<String>, DriverError> {
        if !refresh
            && let Some(cached) = self.catalog_cache.read().unwrap().clone()
        {
            return Ok(cached);
        }

        let pool = self.pool()?;
        let rows = sqlx::query(
            r#"
            select table_schema, table_name
            from information_schema.tables
            where table_type = 'BASE TABLE'
              and table_schema not in ('pg_catalog', 'information_schema')
            order by table_schema, table_name
            "#,
        )
        .fetch_all(&pool)
        .await?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            let schema: String = row.get("table_schema");
            let name: String = row.get("table_name");
            names.push(qualify(&schema, &name));
        }

        *self.catalog_cache.write().unwrap() = Some(names.clone());
        Ok(names)
    }

    async fn list_stored_procedures(&self) -> Result<Vec<String>, DriverError> {
        let pool = self.pool()?;
        let rows = sqlx::query(
            r#"
            select routine_schema, routine_name
            from information_schema.routines
            where routine_type = 'PROCEDURE'
              and routine_schema not in ('pg_catalog', 'information_schema')
            order by routine_schema, routine_name
            "#,
        )
        .fetch_all(&pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let schema: String = row.get("routine_schema");
                let name: String = row.get("routine_name");
                qualify(&schema, &name)
            })
            .collect())
    }

    async fn list_stored_functions(&self) -> Result<Vec<String>, DriverError> {
        let pool = self.pool()?;
        let rows = sqlx::query(
            r#"
            select routine_schema, routine_name
            from information_schema.routines
            where routine_type = 'FUNCTION'
              and routine_schema not in ('pg_catalog', 'information_schema')
            order by routine_schema, routine_name
            "#,
        )
        .fetch_all(&pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let schema: String = row.get("routine_schema");
                let name: String = row.get("routine_name");
                qualify(&schema, &name)
            })
            .collect())
    }

    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>, DriverError> {
        let (schema, table) = match name.split_once('.') {
            Some((schema, table)) => (schema.to_string(), table.to_string()),
            None => ("public".to_string(), name.to_string()),
        };
        let pool = self.pool()?;

        let col_rows = sqlx::query(
            r#"
            select column_name, data_type, is_nullable, column_default
            from information_schema.columns
            where table_schema = $1 and table_name = $2
            order by ordinal_position
            "#,
        )
        .bind(&schema)
        .bind(&table)
        .fetch_all(&pool)
        .await?;

        if col_rows.is_empty() {
            return Ok(None);
        }

        let mut columns = Vec::with_capacity(col_rows.len());
        for row in col_rows {
            let is_nullable: String = row.get("is_nullable");
            columns.push(ColumnDescription {
                name: row.get("column_name"),
                data_type: row.get("data_type"),
                nullable: is_nullable == "YES",
                default: row.get("column_default"),
            });
        }

        let pk_rows = sqlx::query(
            r#"
            select kcu.column_name
            from information_schema.table_constraints tc
            join information_schema.key_column_usage kcu
              on tc.constraint_name = kcu.constraint_name
             and tc.table_schema = kcu.table_schema
            where tc.constraint_type = 'PRIMARY KEY'
              and tc.table_schema = $1
              and tc.table_name = $2
            order by kcu.ordinal_position
            "#,
        )
        .bind(&schema)
        .bind(&table)
        .fetch_all(&pool)
        .await?;

        let primary_key = pk_rows
            .into_iter()
            .map(|row| row.get::<String, _>("column_name"))
            .collect();

        Ok(Some(TableDescription {
            name: table,
            schema: (schema != "public").then_some(schema),
            columns,
            primary_key,
        }))
    }
}
