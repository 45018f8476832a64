//! MySQL driver.
//!
//! Introspection is scoped to the connection's current database via
//! `database()`, so names are always unqualified.

use crate::family::DriverFamily;
use crate::{ColumnDescription, DbDriver, DriverError, TableDescription};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Row;
use std::collections::BTreeMap;
use std::sync::RwLock;

const POOL_SIZE: u32 = 5;

pub struct MySqlDriver {
    connect_options: MySqlConnectOptions,
    pool: RwLock<Option<MySqlPool>>,
    attributes: RwLock<BTreeMap<String, String>>,
    catalog_cache: RwLock<Option<Vec<String>>>,
}

impl MySqlDriver {
    pub async fn open(
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
        options: &BTreeMap<String, String>,
    ) -> Result<Self, DriverError> {
        let mut connect_options = dsn
            .parse::<MySqlConnectOptions>()
            .map_err(|e| DriverError::InvalidDsn(e.to_string()))?;
        if let Some(username) = username {
            connect_options = connect_options.username(username);
        }
        if let Some(password) = password {
            connect_options = connect_options.password(password);
        }
        for (key, value) in options {
            // MySQL exposes a fixed set of connection-level options; the
            // rest only make sense as post-open attributes.
            match key.as_str() {
                "charset" => connect_options = connect_options.charset(value),
                "collation" => connect_options = connect_options.collation(value),
                other => tracing::debug!(option = other, "ignoring unknown connection option"),
            }
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

    fn pool(&self) -> Result<MySqlPool, DriverError> {
        self.pool
            .read()
            .unwrap()
            .clone()
            .filter(|pool| !pool.is_closed())
            .ok_or_else(|| DriverError::Connect("connection is not active".into()))
    }
}

#[async_trait]
impl DbDriver for MySqlDriver {
    fn family(&self) -> DriverFamily {
        DriverFamily::MySql
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
            let pool = MySqlPoolOptions::new()
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
            select table_name as name
            from information_schema.tables
            where table_schema = database()
              and table_type = 'BASE TABLE'
            order by table_name
            "#,
        )
        .fetch_all(&pool)
        .await?;

        let names: Vec<String> = rows
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect();

        *self.catalog_cache.write().unwrap() = Some(names.clone());
        Ok(names)
    }

    async fn list_stored_procedures(&self) -> Result<Vec<String>, DriverError> {
        let pool = self.pool()?;
        let rows = sqlx::query(
            r#"
            select routine_name as name
            from information_schema.routines
            where routine_schema = database()
              and routine_type = 'PROCEDURE'
            order by routine_name
            "#,
        )
        .fetch_all(&pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect())
    }

    async fn list_stored_functions(&self) -> Result<Vec<String>, DriverError> {
        let pool = self.pool()?;
        let rows = sqlx::query(
            r#"
            select routine_name as name
            from information_schema.routines
            where routine_schema = database()
              and routine_type = 'FUNCTION'
            order by routine_name
            "#,
        )
        .fetch_all(&pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect())
    }

    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>, DriverError> {
        let pool = self.pool()?;

        let col_rows = sqlx::query(
            r#"
            select column_name as name, data_type as data_type,
                   is_nullable as is_nullable, column_default as column_default
            from information_schema.columns
            where table_schema = database() and table_name = ?
            order by ordinal_position
            "#,
        )
        .bind(name)
        .fetch_all(&pool)
        .await?;

        if col_rows.is_empty() {
            return Ok(None);
        }

        let mut columns = Vec::with_capacity(col_rows.len());
        for row in col_rows {
            let is_nullable: String = row.get("is_nullable");
            columns.push(ColumnDescription {
                name: row.get("name"),
                data_type: row.get("data_type"),
                nullable: is_nullable == "YES",
                default: row.get("column_default"),
            });
        }

        let pk_rows = sqlx::query(
            r#"
            select column_name as name
            from information_schema.key_column_usage
            where table_schema = database()
              and table_name = ?
              and constraint_name = 'PRIMARY'
            order by ordinal_position
            "#,
        )
        .bind(name)
        .fetch_all(&pool)
        .await?;

        let primary_key = pk_rows
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect();

        Ok(Some(TableDescription {
            name: name.to_string(),
            schema: None,
            columns,
            primary_key,
        }))
    }
}
