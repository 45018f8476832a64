//! End-to-end handler tests over the axum router with a stub driver.
//!
//! The platform pool is lazy and never touched: services are preloaded
//! into the application state, and the registry endpoints are covered by
//! store-level tests against a live platform database.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use portico_core::AccessRight;
use portico_core::StaticOracle;
use portico_driver::{
    ColumnDescription, DbDriver, DriverConnector, DriverError, DriverFamily, TableDescription,
};
use portico_server::config::{OracleConfig, OracleMode};
use portico_server::routes::create_router;
use portico_server::state::AppState;
use portico_sqldb::{ConfigStore, SqlDbConfig, SqlDbService};
use sqlx::postgres::PgPoolOptions;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tower::ServiceExt;

struct TestDriver;

#[async_trait]
impl DbDriver for TestDriver {
    fn family(&self) -> DriverFamily {
        DriverFamily::Postgres
    }

    fn set_attribute(&self, _key: &str, _value: &str) {}

    fn attribute(&self, _key: &str) -> Option<String> {
        None
    }

    fn is_active(&self) -> bool {
        true
    }

    async fn set_active(&self, _active: bool) -> Result<(), DriverError> {
        Ok(())
    }

    async fn list_schemas_and_tables(&self, _refresh: bool) -> Result<Vec<String>, DriverError> {
        Ok(vec!["customers".into(), "orders".into()])
    }

    async fn list_stored_procedures(&self) -> Result<Vec<String>, DriverError> {
        Ok(vec!["sum".into()])
    }

    async fn list_stored_functions(&self) -> Result<Vec<String>, DriverError> {
        Ok(vec!["uppercase".into()])
    }

    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>, DriverError> {
        if name != "orders" {
            return Ok(None);
        }
        Ok(Some(TableDescription {
            name: name.to_string(),
            schema: None,
            columns: vec![ColumnDescription {
                name: "id".into(),
                data_type: "integer".into(),
                nullable: false,
                default: None,
            }],
            primary_key: vec!["id".into()],
        }))
    }
}

struct TestConnector;

#[async_trait]
impl DriverConnector for TestConnector {
    async fn open(
        &self,
        _dsn: &str,
        _username: Option<&str>,
        _password: Option<&str>,
        _options: &BTreeMap<String, String>,
    ) -> Result<Box<dyn DbDriver>, DriverError> {
        Ok(Box::new(TestDriver))
    }
}

async fn app_with(oracle: OracleConfig) -> axum::Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/portico_test")
        .unwrap();
    let state = AppState::with_connector(ConfigStore::new(pool), oracle, Box::new(TestConnector));

    let config = SqlDbConfig {
        dsn: "postgres://localhost/app".into(),
        ..Default::default()
    };
    let service = SqlDbService::from_config("db1", &config, &TestConnector)
        .await
        .unwrap();
    state.register(Arc::new(service)).await;

    create_router(state)
}

fn granted_oracle() -> OracleConfig {
    OracleConfig {
        mode: OracleMode::Static,
        grants: HashMap::from([(
            "db1".to_string(),
            StaticOracle::new()
                .grant("table/", [AccessRight::Read])
                .grant("table/orders", [AccessRight::Read]),
        )]),
    }
}

async fn get_json(
    app: &axum::Router,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn test_healthz() {
    let app = app_with(OracleConfig::default()).await;
    let (status, body) = get_json(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_plain_listing_is_static() {
    let app = app_with(OracleConfig::default()).await;
    let (status, body) = get_json(&app, "/db1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({ "resource": ["schema", "table", "procedure", "function"] })
    );
}

#[tokio::test]
async fn test_listing_with_properties_carries_labels() {
    let app = app_with(OracleConfig::default()).await;
    let (status, body) = get_json(&app, "/db1?include_properties=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["resource"][1],
        serde_json::json!({ "name": "table", "label": "Table" })
    );
}

#[tokio::test]
async fn test_access_components_filtered_by_grants() {
    let app = app_with(granted_oracle()).await;
    let (status, body) = get_json(&app, "/db1?as_access_components=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({ "resource": ["table/", "table/*", "table/orders"] })
    );
}

#[tokio::test]
async fn test_access_components_accepts_numeric_flag() {
    let app = app_with(granted_oracle()).await;
    let (status, body) = get_json(&app, "/db1?as_access_components=1&refresh=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({ "resource": ["table/", "table/*", "table/orders"] })
    );
}

#[tokio::test]
async fn test_table_listing() {
    let app = app_with(OracleConfig::default()).await;
    let (status, body) = get_json(&app, "/db1/table").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "resource": ["customers", "orders"] }));
}

#[tokio::test]
async fn test_schema_describe() {
    let app = app_with(OracleConfig::default()).await;
    let (status, body) = get_json(&app, "/db1/schema/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "orders");
    assert_eq!(body["primary_key"], serde_json::json!(["id"]));
}

#[tokio::test]
async fn test_unknown_resource_is_404_with_error_envelope() {
    let app = app_with(OracleConfig::default()).await;
    let (status, body) = get_json(&app, "/db1/widget").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 404);
}

#[tokio::test]
async fn test_ungranted_resource_is_403() {
    let app = app_with(granted_oracle()).await;
    let (status, body) = get_json(&app, "/db1/function").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], 403);
}

#[tokio::test]
async fn test_ungranted_service_is_403() {
    let app = app_with(granted_oracle()).await;
    let (status, _body) = get_json(&app, "/db2").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
