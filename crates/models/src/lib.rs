//! Data model for resource records: the generic [`record::Record`], the
//! configuration-driven [`schema::ResourceSchema`] that validates input, and
//! the SeaORM entity used by the relational store.

pub mod errors;
pub mod db;
pub mod record;
pub mod schema;
pub mod resource_record;

#[cfg(test)]
mod tests;
