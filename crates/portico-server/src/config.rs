//! Server configuration.
//!
//! Loaded from a YAML file; every section has working defaults so a bare
//! `portico-server` run only needs `DATABASE_URL` in the environment.

use portico_core::{AllowAllOracle, PermissionOracle, StaticOracle};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub platform_db: PlatformDbConfig,

    #[serde(default)]
    pub oracle: OracleConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Bind address, e.g. "0.0.0.0:8080".
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Where the platform database lives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformDbConfig {
    /// Environment variable holding the database URL. Highest precedence.
    #[serde(default)]
    pub database_url_env: Option<String>,

    /// Direct database URL.
    #[serde(default)]
    pub database_url: Option<String>,
}

impl PlatformDbConfig {
    pub fn connection_string(&self) -> Option<String> {
        if let Some(env_var) = &self.database_url_env
            && let Ok(url) = std::env::var(env_var)
        {
            return Some(url);
        }
        self.database_url.clone()
    }
}

/// Which permission oracle the server wires into services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub mode: OracleMode,

    /// Per-service path grants, honored in `static` mode.
    #[serde(default)]
    pub grants: HashMap<String, StaticOracle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleMode {
    /// Every caller holds every right. Development only.
    #[default]
    AllowAll,
    /// Rights come from the configured grants table.
    Static,
}

impl OracleConfig {
    /// The oracle handed to one service's handlers.
    pub fn for_service(&self, service: &str) -> Arc<dyn PermissionOracle> {
        match self.mode {
            OracleMode::AllowAll => Arc::new(AllowAllOracle),
            OracleMode::Static => {
                Arc::new(self.grants.get(service).cloned().unwrap_or_default())
            }
        }
    }

    /// Service-level access check for requests with no resource segment.
    /// In static mode a service without grants is invisible.
    pub fn service_allowed(&self, service: &str) -> bool {
        match self.mode {
            OracleMode::AllowAll => true,
            OracleMode::Static => self.grants.get(service).is_some_and(|g| !g.is_empty()),
        }
    }
}
