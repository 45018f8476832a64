//! Driver family classification and per-family attribute defaults.

use serde::{Deserialize, Serialize};

/// Well-known driver attribute keys.
///
/// Attributes are free-form key-value pairs; these constants name the ones
/// the platform itself sets. Drivers keep unrecognized keys for readback.
pub mod attr {
    /// Client-side prepared-statement emulation ("1"/"0").
    pub const EMULATE_PREPARES: &str = "emulate_prepares";
    /// How driver-level failures are reported ("silent", "warning",
    /// "exception").
    pub const ERROR_MODE: &str = "error_mode";
}

/// The classification of the underlying database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverFamily {
    /// MySQL and compatible engines (MariaDB).
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server via the native driver.
    SqlServer,
    /// SQL Server / Sybase over the TDS (dblib) driver.
    Dblib,
    /// Oracle.
    Oracle,
    /// Anything else.
    Other,
}

impl std::fmt::Display for DriverFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MySql => write!(f, "mysql"),
            Self::Postgres => write!(f, "postgres"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::SqlServer => write!(f, "sqlsrv"),
            Self::Dblib => write!(f, "dblib"),
            Self::Oracle => write!(f, "oracle"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl DriverFamily {
    /// Classify a connection string by its scheme prefix.
    ///
    /// Both URL-style (`mysql://host/db`) and key-value DSNs
    /// (`mysql:host=localhost;dbname=db`) start with the driver name.
    pub fn from_dsn(dsn: &str) -> Self {
        let scheme = dsn.split(':').next().unwrap_or("").to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Self::MySql,
            "pgsql" | "postgres" | "postgresql" => Self::Postgres,
            "sqlite" => Self::Sqlite,
            "sqlsrv" | "mssql" => Self::SqlServer,
            "dblib" | "sybase" => Self::Dblib,
            "oci" | "oracle" => Self::Oracle,
            _ => Self::Other,
        }
    }
}

/// Family-specific attribute defaults.
///
/// Applied at service construction before any user-supplied overrides:
/// MySQL needs prepared-statement emulation for routine calls, and the TDS
/// driver only reports errors usably when raised as exceptions.
pub fn default_attributes(family: DriverFamily) -> &'static [(&'static str, &'static str)] {
    match family {
        DriverFamily::MySql => &[(attr::EMULATE_PREPARES, "1")],
        DriverFamily::Dblib => &[(attr::ERROR_MODE, "exception")],
        _ => &[],
    }
}
