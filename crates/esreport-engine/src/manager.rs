//! Per-category report stack and submission

use anyhow::{Context as _, Result};
use esreport_config::Config;
use esreport_core::{
    AppInfo, Context, CoreError, DataContext, JobReport, Report, RequestReport, format_log_line,
    index_name,
};
use esreport_security::Redactor;
use esreport_storage::DocumentStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, warn};

pub type JobManager = Manager<JobReport>;
pub type RequestManager = Manager<RequestReport>;

/// Everything a manager needs besides its store and redactor
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub prefix: String,
    pub app: AppInfo,
    pub max_request: usize,
    pub max_response: usize,
    /// Upper bound for a single store write
    pub timeout: Duration,
}

impl ManagerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.prefix(),
            app: AppInfo::new(config.app.env.clone(), config.group(), config.app.name.clone()),
            max_request: config.max_request,
            max_response: config.max_response,
            timeout: Duration::from_secs(config.elasticsearch.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    String,
    Number,
    Bool,
    Object,
    Array,
}

impl ValueKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(_) => Some(Self::String),
            Value::Number(_) => Some(Self::Number),
            Value::Bool(_) => Some(Self::Bool),
            Value::Object(_) => Some(Self::Object),
            Value::Array(_) => Some(Self::Array),
        }
    }
}

/// Owns the stack of in-flight reports of one category.
///
/// Only the top of the stack receives context, output and log writes.
pub struct Manager<R: Report> {
    store: Arc<dyn DocumentStore>,
    redactor: Arc<Redactor>,
    settings: ManagerSettings,
    stack: Vec<R>,
    global_kinds: HashMap<String, ValueKind>,
}

impl<R: Report> Manager<R> {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        redactor: Arc<Redactor>,
        settings: ManagerSettings,
    ) -> Self {
        Self {
            store,
            redactor,
            settings,
            stack: Vec::new(),
            global_kinds: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn add_report(&mut self, report: R) {
        debug!(id = report.id(), depth = self.stack.len() + 1, "Report added");
        self.stack.push(report);
    }

    pub fn report(&self) -> Option<&R> {
        self.stack.last()
    }

    pub fn report_mut(&mut self) -> Option<&mut R> {
        self.stack.last_mut()
    }

    /// Drop the active report without writing it
    pub fn discard_report(&mut self) -> Option<R> {
        let report = self.stack.pop();
        if let Some(report) = &report {
            debug!(id = report.id(), "Report discarded");
        }
        report
    }

    /// Partition a report of this category written today lands in
    pub fn index_name(&self, report: &R) -> String {
        index_name(
            &self.settings.prefix,
            report.collection(),
            OffsetDateTime::now_utc().date(),
        )
    }

    /// Redacted document for `report`
    pub fn document(&self, report: &R) -> Value {
        let ctx = DataContext {
            app: &self.settings.app,
            redactor: &self.redactor,
            max_request: self.settings.max_request,
            max_response: self.settings.max_response,
        };

        self.redactor
            .redact_structure(Value::Object(report.data(&ctx)))
    }

    /// Pop the active report and write it to the store.
    ///
    /// The report leaves the stack even when the write fails.
    pub async fn submit_report(&mut self) -> Result<R> {
        let report = self.stack.pop().ok_or(CoreError::NoActiveReport)?;
        let index = self.index_name(&report);
        let document = self.document(&report);

        tokio::time::timeout(
            self.settings.timeout,
            self.store.index_document(&index, report.id(), &document),
        )
        .await
        .with_context(|| format!("Timed out writing report {} to {}", report.id(), index))?
        .with_context(|| format!("Failed to write report {} to {}", report.id(), index))?;

        debug!(id = report.id(), %index, "Report submitted");
        Ok(report)
    }

    fn with_base<F>(&mut self, f: F)
    where
        F: FnOnce(&mut esreport_core::ReportBase),
    {
        if let Some(report) = self.stack.last_mut() {
            f(report.base_mut());
        }
    }

    pub fn set_context_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.with_base(|base| {
            base.set_context_name(name);
        });
    }

    pub fn set_context(&mut self, context: Context) {
        self.with_base(|base| {
            base.set_context(context);
        });
    }

    pub fn add_context(&mut self, context: Context) {
        self.with_base(|base| {
            base.add_context(context);
        });
    }

    pub fn set_global_context(&mut self, context: Context) {
        if self.stack.is_empty() {
            return;
        }
        let context = self.check_global_kinds(context);
        self.with_base(|base| {
            base.set_global_context(context);
        });
    }

    pub fn add_global_context(&mut self, context: Context) {
        if self.stack.is_empty() {
            return;
        }
        let context = self.check_global_kinds(context);
        self.with_base(|base| {
            base.add_global_context(context);
        });
    }

    pub fn set_output(&mut self, output: impl Into<String>) {
        let output = output.into();
        self.with_base(|base| {
            base.set_output(output);
        });
    }

    pub fn write_output(&mut self, chunk: &str) {
        self.with_base(|base| {
            base.write_output(chunk);
        });
    }

    pub fn set_log(&mut self, log: impl Into<String>) {
        let log = log.into();
        self.with_base(|base| {
            base.set_log(log);
        });
    }

    pub fn write_log(&mut self, line: &str) {
        self.with_base(|base| {
            base.write_log(line);
        });
    }

    /// Append a formatted log line to the active report.
    ///
    /// Nothing is captured implicitly: the host forwards its own log events
    /// here for them to appear in the report's `log` field.
    pub fn log(&mut self, level: &str, message: &str) {
        let line = format_log_line(OffsetDateTime::now_utc(), level, message);
        self.write_log(&line);
    }

    /// Global context keys keep the value kind they were first seen with;
    /// values of another kind are dropped.
    fn check_global_kinds(&mut self, context: Context) -> Context {
        context
            .into_iter()
            .filter(|(key, value)| {
                let Some(kind) = ValueKind::of(value) else {
                    return true;
                };

                match self.global_kinds.get(key) {
                    Some(expected) if *expected != kind => {
                        warn!(
                            key = %key,
                            expected = ?expected,
                            got = ?kind,
                            "Dropping global context value with inconsistent type"
                        );
                        false
                    }
                    Some(_) => true,
                    None => {
                        self.global_kinds.insert(key.clone(), kind);
                        true
                    }
                }
            })
            .collect()
    }
}
