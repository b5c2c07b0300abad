use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use models::errors::FieldError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Error returned by resource handlers; every variant renders as an `ErrorBody`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(FieldError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    /// Cause is logged where the error is converted, never sent to the client.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(fe) => ErrorBody::new(fe.message()).with_field(&fe.field, fe.reason.as_str()),
            other => ErrorBody::new(other.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(fe) => ApiError::Validation(fe),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            e @ (ServiceError::Db(_) | ServiceError::Timeout(_) | ServiceError::Config(_)) => {
                error!(error = %e, "storage failure");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage unavailable: {0}")]
    Storage(ServiceError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl From<ServiceError> for StartupError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Config(m) => StartupError::InvalidConfig(m),
            other => StartupError::Storage(other),
        }
    }
}
