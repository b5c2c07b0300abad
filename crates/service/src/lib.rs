//! Service layer providing CRUD operations for configured resources.
//! - Validation rules come from `models::schema`, persistence from a `RecordStore`.
//! - `ResourceRegistry` maps resource names to their services.
//! - Errors are reported through `ServiceError`.

pub mod errors;
pub mod pagination;
pub mod resource;
pub mod runtime;
pub mod storage;
#[cfg(test)]
pub mod test_support;

pub use resource::{ResourceRegistry, ResourceService};
pub use storage::{RecordStore, Storage};
