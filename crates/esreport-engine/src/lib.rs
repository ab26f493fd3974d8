//! Report capture, submission and index maintenance

pub mod capture;
pub mod manager;
pub mod pruner;

pub use capture::{JobCapture, RequestCapture};
pub use manager::{JobManager, Manager, ManagerSettings, RequestManager};
pub use pruner::{PruneResult, Pruner};

use anyhow::{Context as _, Result, bail};
use esreport_config::{AuthType, Config};
use esreport_core::Collection;
use esreport_security::Redactor;
use esreport_storage::{Auth, DocumentStore, ElasticsearchStore, template_for};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Elasticsearch store for `config`, `None` when no host is configured
pub fn build_store(config: &Config) -> Result<Option<Arc<dyn DocumentStore>>> {
    if !config.has_store() {
        return Ok(None);
    }

    let es = &config.elasticsearch;
    let auth = match es.auth_type {
        AuthType::Url => Auth::Url,
        AuthType::Apikey => {
            let (Some(id), Some(key)) = (&es.auth_api_id, &es.auth_api_key) else {
                bail!("apikey authentication requires auth_api_id and auth_api_key");
            };
            Auth::ApiKey {
                id: id.clone(),
                key: key.clone(),
            }
        }
    };

    let store = ElasticsearchStore::new(&es.hosts, auth, Duration::from_secs(es.timeout_secs))
        .context("Failed to create Elasticsearch client")?;

    let store: Arc<dyn DocumentStore> = Arc::new(store);
    Ok(Some(store))
}

pub fn build_redactor(config: &Config) -> Redactor {
    Redactor::new(config.redaction.clone(), config.redaction_ink.clone())
}

/// Job and request hooks wired from `config`, or `None` when no store is
/// configured and capture is therefore off.
pub fn build_captures(config: &Config) -> Result<Option<(JobCapture, RequestCapture)>> {
    let Some(store) = build_store(config)? else {
        return Ok(None);
    };

    let redactor = Arc::new(build_redactor(config));
    let settings = ManagerSettings::from_config(config);

    let jobs = JobCapture::new(
        Manager::new(store.clone(), redactor.clone(), settings.clone()),
        config.jobs,
        config.job_attempts,
    );
    let requests = RequestCapture::new(Manager::new(store, redactor, settings), config.requests);

    Ok(Some((jobs, requests)))
}

/// Create or replace the index templates of every report family
pub async fn configure_indices(store: &dyn DocumentStore, prefix: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for collection in Collection::ALL {
        let name = collection.template_name(prefix);
        store
            .put_template(&name, &template_for(collection, prefix))
            .await
            .with_context(|| format!("Failed to put template {}", name))?;

        info!(template = %name, "Index template configured");
        names.push(name);
    }

    Ok(names)
}
