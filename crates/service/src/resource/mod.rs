//! Resource services: one [`service::ResourceService`] per configured schema,
//! looked up by name through [`registry::ResourceRegistry`].

pub mod registry;
pub mod service;

pub use registry::ResourceRegistry;
pub use service::ResourceService;
