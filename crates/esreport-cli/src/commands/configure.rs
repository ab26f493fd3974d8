use anyhow::Result;
use esreport_config::Config;
use esreport_engine::configure_indices;
use esreport_storage::DocumentStore;
use std::sync::Arc;
use tracing::warn;

pub async fn handle(
    config: &Config,
    store: Option<Arc<dyn DocumentStore>>,
    prefix: Option<String>,
    force: bool,
) -> Result<()> {
    let Some(store) = store else {
        warn!("No Elasticsearch host configured.");
        return Ok(());
    };

    let prefix = prefix.unwrap_or_else(|| config.prefix());

    if !force
        && !super::confirm(&format!(
            "Reset settings for all indices with prefix \"{}\"?",
            prefix
        ))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    for name in configure_indices(&*store, &prefix).await? {
        println!("✓ Configured template: {}", name);
    }
    println!("✓ Indices configured.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esreport_storage::MemoryStore;

    #[tokio::test]
    async fn test_configure_without_host_succeeds() {
        handle(&Config::default(), None, None, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_configure_uses_config_prefix() {
        let store = Arc::new(MemoryStore::new());
        handle(&Config::default(), Some(store.clone()), None, true)
            .await
            .unwrap();

        assert!(store.template("production_reports-jobs").is_some());
        assert!(store.template("production_reports-requests").is_some());
    }

    #[tokio::test]
    async fn test_configure_with_explicit_prefix() {
        let store = Arc::new(MemoryStore::new());
        handle(&Config::default(), Some(store.clone()), Some("dev_".into()), true)
            .await
            .unwrap();

        assert!(store.template("dev_reports-jobs").is_some());
    }
}
