//! Redaction of sensitive report fields
//!
//! This crate contains:
//! - Key-based masking of nested JSON documents
//! - Header block redaction
//! - Redaction and pretty-printing of serialized JSON bodies

pub mod json;
pub mod redactor;

pub use json::{format_json, to_pretty_json};
pub use redactor::{DEFAULT_INK, Redactor, default_keys};
