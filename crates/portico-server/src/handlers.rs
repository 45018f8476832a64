//! REST handlers: the system service registry plus the per-service
//! database resource surface.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portico_core::{AccessRight, RecordSet};
use portico_sqldb::service::ResourceResponse;
use portico_sqldb::{NewService, SERVICE_TYPE};
use serde::Deserialize;
use serde_json::json;

/// Query options on listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default, deserialize_with = "portico_core::de::flexible_bool")]
    pub as_access_components: bool,

    #[serde(default, deserialize_with = "portico_core::de::flexible_bool")]
    pub include_properties: bool,

    #[serde(default, deserialize_with = "portico_core::de::flexible_bool")]
    pub refresh: bool,
}

/// Query options on record endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RecordParams {
    pub ids: Option<String>,
    pub fields: Option<String>,
}

/// POST body for service registration.
#[derive(Debug, Deserialize)]
pub struct ServicePayload {
    pub record: Vec<NewService>,
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "portico-server" }))
}

fn to_record(value: impl serde::Serialize) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn parse_ids(ids: Option<&str>) -> Result<Option<Vec<i32>>, ApiError> {
    let Some(ids) = ids else { return Ok(None) };
    let parsed = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<i32>()
                .map_err(|_| ApiError::BadRequest(format!("invalid id '{id}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(parsed))
}

pub async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<RecordParams>,
) -> Result<Json<RecordSet>, ApiError> {
    let ids = parse_ids(params.ids.as_deref())?;
    let records = state.store().list_services(ids.as_deref()).await?;
    let record = records
        .into_iter()
        .map(to_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(RecordSet::new(record).project(params.fields.as_deref())))
}

pub async fn create_services(
    State(state): State<AppState>,
    Query(params): Query<RecordParams>,
    Json(payload): Json<ServicePayload>,
) -> Result<(StatusCode, Json<RecordSet>), ApiError> {
    let mut created = Vec::new();
    for service in &payload.record {
        if service.service_type != SERVICE_TYPE {
            return Err(ApiError::BadRequest(format!(
                "unsupported service type '{}'",
                service.service_type
            )));
        }
        if let Some(config) = &service.config {
            config
                .validate()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        }
        created.push(to_record(state.store().create_service(service).await?)?);
    }
    Ok((
        StatusCode::CREATED,
        Json(RecordSet::new(created).project(params.fields.as_deref())),
    ))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<RecordParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state
        .store()
        .get_service(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("record not found".into()))?;

    let mut value = to_record(record)?;
    if params.fields.is_some() {
        value = RecordSet::new(vec![value])
            .project(params.fields.as_deref())
            .record
            .remove(0);
    }
    Ok(Json(value))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state
        .store()
        .get_service(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("record not found".into()))?;

    state.store().delete_service(id).await?;
    state.evict(&record.name).await;
    Ok(Json(json!({ "id": id })))
}

/// Service-level listing: the static resource-kind table (names, or
/// name+label rows when properties are requested), or the
/// permission-filtered access components.
pub async fn service_root(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Response, ApiError> {
    if !state.service_allowed(&service) {
        return Err(ApiError::Forbidden(format!(
            "access denied to service '{service}'"
        )));
    }
    let svc = state.service(&service).await?;

    if params.as_access_components {
        let oracle = state.oracle_for(&service);
        let listing = svc
            .list_access_components(oracle.as_ref(), params.refresh)
            .await?;
        return Ok(Json(listing).into_response());
    }
    if params.include_properties {
        return Ok(Json(svc.list_resource_types()).into_response());
    }
    Ok(Json(svc.list_resources()).into_response())
}

/// Resource dispatch under one service.
pub async fn service_resource(
    State(state): State<AppState>,
    Path((service, resource)): Path<(String, String)>,
    Query(params): Query<ListingParams>,
) -> Result<Json<ResourceResponse>, ApiError> {
    if !state.service_allowed(&service) {
        return Err(ApiError::Forbidden(format!(
            "access denied to service '{service}'"
        )));
    }
    let svc = state.service(&service).await?;
    let oracle = state.oracle_for(&service);
    let response = svc
        .handle_resource(&resource, AccessRight::Read, oracle.as_ref(), params.refresh)
        .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids(None).unwrap(), None);
        assert_eq!(
            parse_ids(Some("1, 2,3")).unwrap(),
            Some(vec![1, 2, 3])
        );
        assert!(parse_ids(Some("1,x")).is_err());
    }
}
