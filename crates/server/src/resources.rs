use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::types::DataEnvelope;
use models::record::Record;
use serde_json::{Map, Value};
use service::pagination::Pagination;
use service::ResourceService;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::routes::AppState;

fn lookup<'a>(state: &'a AppState, resource: &str) -> Result<&'a ResourceService, ApiError> {
    state
        .registry
        .get(resource)
        .ok_or_else(|| ApiError::NotFound(format!("unknown resource `{resource}`")))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid id `{raw}`")))
}

fn body_object(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(_) => Err(ApiError::BadRequest("request body must be a JSON object".into())),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

/// Malformed paging values fall back to their defaults.
fn take_i64(query: &mut BTreeMap<String, String>, key: &str) -> Option<i64> {
    let raw = query.remove(key)?;
    match raw.trim().parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(key, value = %raw, "ignoring malformed paging parameter");
            None
        }
    }
}

#[utoipa::path(
    get, path = "/{resource}", tag = "resources",
    params(
        ("resource" = String, Path, description = "Resource name, e.g. claims"),
        ("page" = Option<i64>, Query, description = "1-based page, default 1"),
        ("limit" = Option<i64>, Query, description = "Page size, clamped to the resource maximum"),
    ),
    responses(
        (status = 200, description = "Records newest first", body = crate::openapi::RecordListDoc),
        (status = 404, description = "Unknown resource", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Storage failure", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    query: Result<Query<BTreeMap<String, String>>, QueryRejection>,
) -> Result<Json<DataEnvelope<Record>>, ApiError> {
    let svc = lookup(&state, &resource)?;
    let Query(mut filters) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = Pagination { page: take_i64(&mut filters, "page"), limit: take_i64(&mut filters, "limit") };
    let data = svc.list_page(&filters, page).await?;
    Ok(Json(DataEnvelope { data }))
}

#[utoipa::path(
    post, path = "/{resource}", tag = "resources",
    params(("resource" = String, Path, description = "Resource name")),
    request_body = crate::openapi::RecordInputDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::RecordDoc),
        (status = 400, description = "Malformed body", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Unknown resource", body = crate::openapi::ErrorDoc),
        (status = 422, description = "Validation Error", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Storage failure", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let svc = lookup(&state, &resource)?;
    let input = body_object(payload)?;
    let record = svc.create(&input).await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

#[utoipa::path(
    get, path = "/{resource}/{id}", tag = "resources",
    params(
        ("resource" = String, Path, description = "Resource name"),
        ("id" = Uuid, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "OK", body = crate::openapi::RecordDoc),
        (status = 400, description = "Malformed id", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn find(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Record>, ApiError> {
    let svc = lookup(&state, &resource)?;
    let id = parse_id(&id)?;
    svc.find(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("{resource} {id} not found")))
}

#[utoipa::path(
    patch, path = "/{resource}/{id}", tag = "resources",
    params(
        ("resource" = String, Path, description = "Resource name"),
        ("id" = Uuid, Path, description = "Record ID")
    ),
    request_body = crate::openapi::RecordInputDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::RecordDoc),
        (status = 400, description = "Malformed id or body", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc),
        (status = 422, description = "Validation Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let svc = lookup(&state, &resource)?;
    let id = parse_id(&id)?;
    let input = body_object(payload)?;
    Ok(Json(svc.update(id, &input).await?))
}

/// `PUT` shares the partial-update semantics of `PATCH`.
#[utoipa::path(
    put, path = "/{resource}/{id}", tag = "resources",
    params(
        ("resource" = String, Path, description = "Resource name"),
        ("id" = Uuid, Path, description = "Record ID")
    ),
    request_body = crate::openapi::RecordInputDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::RecordDoc),
        (status = 400, description = "Malformed id or body", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc),
        (status = 422, description = "Validation Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn replace(
    state: State<AppState>,
    path: Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    update(state, path, payload).await
}

#[utoipa::path(
    delete, path = "/{resource}/{id}", tag = "resources",
    params(
        ("resource" = String, Path, description = "Resource name"),
        ("id" = Uuid, Path, description = "Record ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let svc = lookup(&state, &resource)?;
    let id = parse_id(&id)?;
    svc.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
