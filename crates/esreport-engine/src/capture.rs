//! Hooks called by the code that drives job and request execution.
//!
//! Capture never interferes with the work being observed: every failure in
//! the capture path is logged here and then dropped.

use anyhow::{Context as _, Result};
use esreport_core::{ExceptionInfo, HttpRequest, HttpResponse, JobReport, QueuedJob, Report, RequestReport};
use tracing::error;

use crate::manager::{JobManager, RequestManager};

fn log_failure(hook: &str, result: Result<()>) {
    if let Err(e) = result {
        error!(hook, error = ?e, "Report capture failed");
    }
}

/// Job lifecycle hooks
pub struct JobCapture {
    manager: JobManager,
    enabled: bool,
    attempts: bool,
}

impl JobCapture {
    /// `enabled` turns capture on; `attempts` also records failed attempts
    /// that will be retried.
    pub fn new(manager: JobManager, enabled: bool, attempts: bool) -> Self {
        Self {
            manager,
            enabled,
            attempts,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn manager(&self) -> &JobManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut JobManager {
        &mut self.manager
    }

    /// The job is about to run
    pub fn on_processing(&mut self, job: QueuedJob) {
        if !self.enabled {
            return;
        }

        let mut report = JobReport::new(job);
        report.base_mut().mark_started();
        self.manager.add_report(report);
    }

    /// The job completed
    pub async fn on_processed(&mut self) {
        if !self.enabled {
            return;
        }
        log_failure("job_processed", self.finish(true, None).await);
    }

    /// The job failed on its final attempt
    pub async fn on_failed(&mut self, exception: ExceptionInfo) {
        if !self.enabled {
            return;
        }
        log_failure("job_failed", self.finish(false, Some(exception)).await);
    }

    /// The job raised but will be retried
    pub async fn on_exception_occurred(&mut self, exception: ExceptionInfo) {
        if !self.enabled {
            return;
        }

        if self.attempts {
            log_failure(
                "job_exception_occurred",
                self.finish(false, Some(exception)).await,
            );
        } else {
            self.manager.discard_report();
        }
    }

    async fn finish(&mut self, success: bool, exception: Option<ExceptionInfo>) -> Result<()> {
        let report = self
            .manager
            .report_mut()
            .context("No job report in progress")?;

        report
            .base_mut()
            .mark_finished()
            .set_success(success)
            .set_exception(exception);

        self.manager.submit_report().await?;
        Ok(())
    }
}

/// Request middleware
pub struct RequestCapture {
    manager: RequestManager,
    enabled: bool,
}

impl RequestCapture {
    pub fn new(manager: RequestManager, enabled: bool) -> Self {
        Self { manager, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn manager(&self) -> &RequestManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut RequestManager {
        &mut self.manager
    }

    /// Run `handler` for `request`, reporting the exchange.
    ///
    /// The handler receives the manager so it can attach context to the
    /// report in progress. Its response is returned unchanged whatever
    /// happens to the report.
    pub async fn observe<F>(
        &mut self,
        request: HttpRequest,
        name: Option<String>,
        handler: F,
    ) -> HttpResponse
    where
        F: AsyncFnOnce(HttpRequest, &mut RequestManager) -> HttpResponse,
    {
        if !self.enabled {
            return handler(request, &mut self.manager).await;
        }

        let mut report = RequestReport::new(request.clone(), name);
        report.base_mut().mark_started();
        self.manager.add_report(report);

        let response = handler(request, &mut self.manager).await;

        log_failure("request", self.finish(&response).await);
        response
    }

    async fn finish(&mut self, response: &HttpResponse) -> Result<()> {
        let report = self
            .manager
            .report_mut()
            .context("No request report in progress")?;

        report.base_mut().mark_finished();
        report.set_response(response.clone());

        self.manager.submit_report().await?;
        Ok(())
    }
}
