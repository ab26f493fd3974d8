//! Report base and the capability shared by both report variants

use esreport_security::Redactor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::macros::format_description;
use time::{OffsetDateTime, format_description::BorrowedFormatItem};

use crate::app::AppInfo;
use crate::collection::Collection;

/// Free-form context attached to a report
pub type Context = Map<String, Value>;

/// Flat, indexable representation of a report
pub type Document = Map<String, Value>;

const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
);

const LOG_LINE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Format a timestamp as RFC 3339 with millisecond precision.
pub(crate) fn format_datetime(at: Option<OffsetDateTime>) -> Value {
    at.and_then(|t| t.format(DATETIME_FORMAT).ok())
        .map(Value::String)
        .unwrap_or(Value::Null)
}

/// Seconds between two instants, `None` if either is missing or the span is negative.
pub(crate) fn seconds_between(
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
) -> Option<f64> {
    match (from, to) {
        (Some(from), Some(to)) if to >= from => Some((to - from).as_seconds_f64()),
        _ => None,
    }
}

/// `[2020-01-15 10:30:00] ERROR: message`
pub fn format_log_line(at: OffsetDateTime, level: &str, message: &str) -> String {
    let stamp = at.format(LOG_LINE_FORMAT).unwrap_or_default();
    format!("[{}] {}: {}", stamp, level.to_uppercase(), message)
}

/// Structured description of a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub class: String,
    pub message: String,
    pub code: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub trace: String,
}

impl ExceptionInfo {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            code: None,
            file: None,
            line: None,
            trace: String::new(),
        }
    }

    /// Describe an error value, using its source chain as the trace.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let mut trace = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push(format!("#{} {}", trace.len(), cause));
            source = cause.source();
        }

        Self {
            trace: trace.join("\n"),
            ..Self::new(std::any::type_name::<E>(), error.to_string())
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }
}

/// Everything a report needs from its surroundings to build a document
pub struct DataContext<'a> {
    pub app: &'a AppInfo,
    pub redactor: &'a Redactor,
    pub max_request: usize,
    pub max_response: usize,
}

/// Timing, outcome, context and captured text shared by all reports.
#[derive(Debug, Clone)]
pub struct ReportBase {
    id: String,
    name: Option<String>,
    context: Context,
    global_context: Context,
    created_at: OffsetDateTime,
    started_at: Option<OffsetDateTime>,
    finished_at: Option<OffsetDateTime>,
    success: Option<bool>,
    exception: Option<ExceptionInfo>,
    output: String,
    log: String,
}

impl ReportBase {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: None,
            context: Context::new(),
            global_context: Context::new(),
            created_at: OffsetDateTime::now_utc(),
            started_at: None,
            finished_at: None,
            success: None,
            exception: None,
            output: String::new(),
            log: String::new(),
        }
    }

    /// Document id in the store
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn started_at(&self) -> Option<OffsetDateTime> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<OffsetDateTime> {
        self.finished_at
    }

    pub fn success(&self) -> Option<bool> {
        self.success
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn global_context(&self) -> &Context {
        &self.global_context
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn mark_started(&mut self) -> &mut Self {
        self.mark_started_at(OffsetDateTime::now_utc())
    }

    /// Record the start time. A finish time earlier than `at` is cleared.
    pub fn mark_started_at(&mut self, at: OffsetDateTime) -> &mut Self {
        self.started_at = Some(at);
        if self.finished_at.is_some_and(|finished| finished < at) {
            self.finished_at = None;
        }
        self
    }

    pub fn mark_finished(&mut self) -> &mut Self {
        self.mark_finished_at(OffsetDateTime::now_utc())
    }

    /// Record the finish time, never earlier than the start time.
    pub fn mark_finished_at(&mut self, at: OffsetDateTime) -> &mut Self {
        self.finished_at = Some(match self.started_at {
            Some(started) if at < started => started,
            _ => at,
        });
        self
    }

    pub fn duration(&self) -> Option<f64> {
        seconds_between(self.started_at, self.finished_at)
    }

    pub fn set_success(&mut self, success: bool) -> &mut Self {
        self.success = Some(success);
        self
    }

    pub fn set_exception(&mut self, exception: Option<ExceptionInfo>) -> &mut Self {
        self.exception = exception;
        self
    }

    /// Override the namespace the scoped context is stored under
    pub fn set_context_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_context(&mut self, context: Context) -> &mut Self {
        self.context = context;
        self
    }

    /// Shallow merge, later keys overwrite earlier ones
    pub fn add_context(&mut self, context: Context) -> &mut Self {
        self.context.extend(context);
        self
    }

    pub fn set_global_context(&mut self, context: Context) -> &mut Self {
        self.global_context = context;
        self
    }

    pub fn add_global_context(&mut self, context: Context) -> &mut Self {
        self.global_context.extend(context);
        self
    }

    pub fn set_output(&mut self, output: impl Into<String>) -> &mut Self {
        self.output = output.into();
        self
    }

    pub fn write_output(&mut self, chunk: &str) -> &mut Self {
        self.output.push_str(chunk);
        self.output.push('\n');
        self
    }

    pub fn set_log(&mut self, log: impl Into<String>) -> &mut Self {
        self.log = log.into();
        self
    }

    pub fn write_log(&mut self, line: &str) -> &mut Self {
        self.log.push_str(line);
        self.log.push('\n');
        self
    }

    pub(crate) fn write_success_data(&self, doc: &mut Document) {
        doc.insert("success".into(), self.success.into());
        doc.insert(
            "success_rate".into(),
            u8::from(self.success.unwrap_or(false)).into(),
        );
        doc.insert(
            "exception".into(),
            self.exception
                .as_ref()
                .and_then(|e| serde_json::to_value(e).ok())
                .unwrap_or(Value::Null),
        );
    }

    pub(crate) fn write_duration_data(&self, doc: &mut Document) {
        doc.insert("started_at".into(), format_datetime(self.started_at));
        doc.insert("finished_at".into(), format_datetime(self.finished_at));
        doc.insert("duration".into(), self.duration().into());
    }

    /// The scoped context is nested under `namespace` so that fields of
    /// different report kinds never collide on type in the store.
    pub(crate) fn write_context_data(&self, namespace: &str, doc: &mut Document) {
        let mut context = self.global_context.clone();
        if !self.context.is_empty() {
            context.insert(namespace.to_string(), Value::Object(self.context.clone()));
        }

        doc.insert("namespace".into(), namespace.into());
        doc.insert("context".into(), Value::Object(context));
    }

    pub(crate) fn write_output_data(&self, doc: &mut Document) {
        doc.insert("output".into(), self.output.clone().into());
        doc.insert("log".into(), self.log.clone().into());
    }
}

impl Default for ReportBase {
    fn default() -> Self {
        Self::new()
    }
}

/// A captured unit of work.
///
/// `data` may be called before the report is finished; timing and outcome
/// fields are then null.
pub trait Report: Send {
    fn base(&self) -> &ReportBase;

    fn base_mut(&mut self) -> &mut ReportBase;

    /// Category the report is indexed under
    fn collection(&self) -> Collection;

    /// Assemble the document to index
    fn data(&self, ctx: &DataContext<'_>) -> Document;

    fn id(&self) -> &str {
        self.base().id()
    }
}
