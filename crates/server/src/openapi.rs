use axum::Json;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Error envelope; `field` and `reason` are present on validation errors.
#[derive(ToSchema)]
pub struct ErrorDoc {
    pub error: String,
    pub field: Option<String>,
    /// One of `required`, `invalid_type`, `invalid_enum`, `unknown_field`.
    pub reason: Option<String>,
}

/// Stored record. Business fields declared by the resource schema appear
/// alongside these system fields.
#[derive(ToSchema)]
pub struct RecordDoc {
    pub id: Uuid,
    pub status: String,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

/// Business fields of the resource plus an optional `status`.
#[derive(ToSchema)]
pub struct RecordInputDoc {
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct RecordListDoc { pub data: Vec<RecordDoc> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::resources::list,
        crate::resources::create,
        crate::resources::find,
        crate::resources::update,
        crate::resources::replace,
        crate::resources::delete,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorDoc,
            RecordDoc,
            RecordInputDoc,
            RecordListDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "resources")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_resource_paths() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/{resource}"));
        assert!(paths.contains_key("/{resource}/{id}"));
        assert!(paths["/{resource}/{id}"].get("put").is_some());
        assert!(paths["/{resource}/{id}"].get("patch").is_some());
        assert!(doc["components"]["schemas"].get("ErrorDoc").is_some());
    }
}
