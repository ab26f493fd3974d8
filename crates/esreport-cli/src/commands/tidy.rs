use anyhow::{Result, bail};
use esreport_config::Config;
use esreport_engine::Pruner;
use esreport_storage::DocumentStore;
use std::sync::Arc;
use time::Date;
use tracing::warn;

pub struct TidyArgs {
    pub prefix: Option<String>,
    pub days: Option<i64>,
    pub dry_run: bool,
}

pub async fn handle(
    config: &Config,
    store: Option<Arc<dyn DocumentStore>>,
    args: TidyArgs,
    today: Date,
) -> Result<()> {
    let Some(store) = store else {
        warn!("No Elasticsearch host configured.");
        return Ok(());
    };

    let Some(days) = args.days.or(config.elasticsearch.keep_days) else {
        bail!("Number of days to keep must be given with --days or configured as keep_days");
    };

    let prefix = args.prefix.unwrap_or_else(|| config.prefix());
    let results = Pruner::new(store, prefix)
        .dry_run(args.dry_run)
        .prune(today, days)
        .await?;

    for result in results {
        if result.deleted {
            println!("✓ Pruned {} indices older than {} days", result.collection, days);
        } else {
            println!("Would delete: {}", result.pattern.to_expression());
        }
    }

    Ok(())
}
