//! Core domain models and logic for esreport
//!
//! This crate contains:
//! - Report model (shared base, job and request variants)
//! - Collections and index naming
//! - Retention pattern generation

pub mod app;
pub mod collection;
pub mod error;
pub mod job;
pub mod report;
pub mod request;
pub mod retention;

pub use app::AppInfo;
pub use collection::{Collection, index_name, partition_date};
pub use error::{CoreError, Result};
pub use job::{JobReport, QueuedJob};
pub use report::{Context, DataContext, Document, ExceptionInfo, Report, ReportBase, format_log_line};
pub use request::{HttpRequest, HttpResponse, RequestReport};
pub use retention::{IndexSelector, RetentionPattern, retention_pattern};
