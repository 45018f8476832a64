//! Access-component enumeration: ordering, filtering, and the shared
//! catalog call.

mod common;

use common::{RecordingConnector, StubDriver};
use portico_core::{AccessRight, AllowAllOracle, StaticOracle, full_access};
use portico_driver::DriverFamily;
use portico_sqldb::{SqlDbConfig, SqlDbService};

async fn service_with(driver: StubDriver) -> (SqlDbService, RecordingConnector) {
    let connector = RecordingConnector::new(driver);
    let config = SqlDbConfig {
        dsn: "postgres://localhost/app".into(),
        ..Default::default()
    };
    let service = SqlDbService::from_config("db1", &config, &connector)
        .await
        .unwrap();
    (service, connector)
}

fn catalog_driver() -> StubDriver {
    StubDriver::new(DriverFamily::Postgres)
        .with_tables(["customers", "orders"])
        .with_procedures(["sum"])
        .with_functions(["uppercase"])
}

#[tokio::test]
async fn test_kinds_enumerate_in_fixed_order() {
    let (service, _connector) = service_with(catalog_driver()).await;
    let listing = service
        .list_access_components(&AllowAllOracle, false)
        .await
        .unwrap();

    assert_eq!(
        listing.resource,
        vec![
            "schema/",
            "schema/*",
            "schema/customers",
            "schema/orders",
            "table/",
            "table/*",
            "table/customers",
            "table/orders",
            "procedure/",
            "procedure/*",
            "procedure/sum",
            "function/",
            "function/*",
            "function/uppercase",
        ]
    );
}

#[tokio::test]
async fn test_denied_kind_contributes_nothing() {
    let oracle = StaticOracle::new()
        .grant("table/", [AccessRight::Read])
        .grant("table/orders", [AccessRight::Read]);

    let (service, _connector) = service_with(catalog_driver()).await;
    let listing = service.list_access_components(&oracle, false).await.unwrap();

    assert_eq!(listing.resource, vec!["table/", "table/*", "table/orders"]);
}

#[tokio::test]
async fn test_named_entries_without_kind_marker() {
    // A wildcard grant reaches every named table but not the kind itself.
    let oracle = StaticOracle::new().grant("table/*", full_access());

    let (service, _connector) = service_with(catalog_driver()).await;
    let listing = service.list_access_components(&oracle, false).await.unwrap();

    assert_eq!(listing.resource, vec!["table/customers", "table/orders"]);
}

#[tokio::test]
async fn test_empty_catalog_keeps_markers_only() {
    let oracle = StaticOracle::new()
        .grant("table/", [AccessRight::Read])
        .grant("procedure/", [AccessRight::Read]);

    let (service, _connector) = service_with(StubDriver::new(DriverFamily::Postgres)).await;
    let listing = service.list_access_components(&oracle, false).await.unwrap();

    assert_eq!(
        listing.resource,
        vec!["table/", "table/*", "procedure/", "procedure/*"]
    );
}

#[tokio::test]
async fn test_oracle_denying_everything_yields_empty_listing() {
    let (service, _connector) = service_with(catalog_driver()).await;
    let listing = service
        .list_access_components(&StaticOracle::new(), false)
        .await
        .unwrap();

    assert!(listing.resource.is_empty());
}

#[tokio::test]
async fn test_schema_and_table_share_one_catalog_call() {
    let (service, connector) = service_with(catalog_driver()).await;
    service
        .list_access_components(&AllowAllOracle, false)
        .await
        .unwrap();

    assert_eq!(connector.driver.0.catalog_calls(), vec![false]);
}

#[tokio::test]
async fn test_refresh_reaches_the_driver() {
    let (service, connector) = service_with(catalog_driver()).await;
    service
        .list_access_components(&AllowAllOracle, true)
        .await
        .unwrap();

    assert_eq!(connector.driver.0.catalog_calls(), vec![true]);
}

#[tokio::test]
async fn test_plain_listing_is_the_static_kind_table() {
    let (service, connector) = service_with(catalog_driver()).await;
    let listing = service.list_resources();

    assert_eq!(
        listing.resource,
        vec!["schema", "table", "procedure", "function"]
    );
    // The static list never touches the database.
    assert!(connector.driver.0.catalog_calls().is_empty());
}

#[tokio::test]
async fn test_typed_listing_carries_labels() {
    let (service, _connector) = service_with(catalog_driver()).await;
    let listing = service.list_resource_types();

    let labels: Vec<&str> = listing.resource.iter().map(|t| t.label).collect();
    assert_eq!(labels, ["Schema", "Table", "Stored Procedures", "Stored Functions"]);
    assert_eq!(listing.resource[1].name, "table");
}
