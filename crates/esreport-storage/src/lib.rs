//! Storage layer for esreport
//!
//! This crate provides:
//! - The document store abstraction
//! - Elasticsearch transport with host failover
//! - An in-memory store
//! - Index templates

pub mod elasticsearch;
pub mod error;
pub mod memory;
pub mod store;
pub mod templates;

pub use elasticsearch::{Auth, ElasticsearchStore};
pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use store::DocumentStore;
pub use templates::{jobs_template, requests_template, template_for};
