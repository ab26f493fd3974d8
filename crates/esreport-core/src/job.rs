//! Queued job reports

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::collection::Collection;
use crate::report::{DataContext, Document, Report, ReportBase, format_datetime, seconds_between};

/// Namespace used when a job carries neither a name override nor a command name
const FALLBACK_NAMESPACE: &str = "job";

/// The queue's view of a job being executed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub job_id: String,
    pub queue: String,
    pub connection: String,
    pub payload: Value,
}

impl QueuedJob {
    pub fn new(
        job_id: impl Into<String>,
        queue: impl Into<String>,
        connection: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            queue: queue.into(),
            connection: connection.into(),
            payload,
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.payload
            .pointer("/data/commandName")
            .and_then(Value::as_str)
    }

    fn field(&self, key: &str) -> Value {
        self.payload.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Time the job was pushed onto the queue. Stored as fractional epoch
    /// seconds, either as a number or a numeric string.
    pub fn pushed_at(&self) -> Option<OffsetDateTime> {
        let seconds = match self.payload.get("pushedAt")? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.parse::<f64>().ok()?,
            _ => return None,
        };

        let whole = seconds.trunc();
        let nanos = ((seconds - whole) * 1e9).round() as i64;

        OffsetDateTime::from_unix_timestamp(whole as i64)
            .ok()
            .map(|at| at + time::Duration::nanoseconds(nanos))
    }

    /// Attempt number of the current execution, starting at 1
    pub fn attempts(&self) -> i64 {
        self.payload
            .get("attempts")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            + 1
    }

    pub fn max_attempts(&self) -> i64 {
        self.payload
            .get("maxTries")
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct JobReport {
    base: ReportBase,
    job: QueuedJob,
}

impl JobReport {
    pub fn new(job: QueuedJob) -> Self {
        Self {
            base: ReportBase::new(),
            job,
        }
    }

    pub fn job(&self) -> &QueuedJob {
        &self.job
    }

    pub fn namespace(&self) -> &str {
        self.base
            .name()
            .or_else(|| self.job.command())
            .unwrap_or(FALLBACK_NAMESPACE)
    }
}

impl Report for JobReport {
    fn base(&self) -> &ReportBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ReportBase {
        &mut self.base
    }

    fn collection(&self) -> Collection {
        Collection::Jobs
    }

    fn data(&self, ctx: &DataContext<'_>) -> Document {
        let mut doc = Document::new();
        let queued_at = self.job.pushed_at();
        let payload = ctx.redactor.redact_structure(self.job.payload.clone());

        self.base.write_success_data(&mut doc);
        self.base.write_duration_data(&mut doc);
        self.base.write_context_data(self.namespace(), &mut doc);
        self.base.write_output_data(&mut doc);
        ctx.app.write_to(&mut doc);

        doc.insert("id".into(), self.job.job_id.clone().into());
        doc.insert("job".into(), self.job.command().into());
        doc.insert("display_name".into(), self.job.field("displayName"));
        doc.insert("queue".into(), self.job.queue.clone().into());
        doc.insert("connection".into(), self.job.connection.clone().into());
        doc.insert("type".into(), self.job.field("type"));
        doc.insert(
            "created_at".into(),
            format_datetime(Some(self.base.created_at())),
        );
        doc.insert("queued_at".into(), format_datetime(queued_at));
        doc.insert(
            "queued_to_started".into(),
            seconds_between(queued_at, self.base.started_at()).into(),
        );
        doc.insert(
            "queued_to_finished".into(),
            seconds_between(queued_at, self.base.finished_at()).into(),
        );
        doc.insert("attempts".into(), self.job.attempts().into());
        doc.insert("max_attempts".into(), self.job.max_attempts().into());
        doc.insert("request_id".into(), self.job.field("requestId"));
        doc.insert(
            "payload".into(),
            esreport_security::to_pretty_json(&payload).into(),
        );

        doc
    }
}
