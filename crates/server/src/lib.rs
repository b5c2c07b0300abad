pub mod errors;
pub mod metrics;
pub mod openapi;
pub mod resources;
pub mod routes;
pub mod startup;

pub use startup::run;
