use std::time::Duration;

use models::errors::{FieldError, ModelError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] FieldError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid resource schema: {0}")]
    Config(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Storage-class failures: the caller cannot fix these by changing input.
    pub fn is_storage(&self) -> bool { matches!(self, Self::Db(_) | Self::Timeout(_)) }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(e) => Self::Validation(e),
            ModelError::Schema(m) => Self::Config(m),
            ModelError::Db(m) => Self::Db(m),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(err: sea_orm::DbErr) -> Self { Self::Db(err.to_string()) }
}
