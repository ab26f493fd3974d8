//! Retention enforcement

use anyhow::{Context as _, Result};
use esreport_core::{Collection, RetentionPattern, retention_pattern};
use esreport_storage::DocumentStore;
use std::sync::Arc;
use time::Date;
use tracing::info;

/// Outcome of pruning one index family
#[derive(Debug, Clone)]
pub struct PruneResult {
    pub collection: Collection,
    pub pattern: RetentionPattern,
    /// `false` on a dry run
    pub deleted: bool,
}

/// Deletes report partitions older than the retention window
pub struct Pruner {
    store: Arc<dyn DocumentStore>,
    prefix: String,
    dry_run: bool,
}

impl Pruner {
    pub fn new(store: Arc<dyn DocumentStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            dry_run: false,
        }
    }

    /// Compute and log patterns without deleting anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Keep the partitions of the `keep_days` days before `today`, one
    /// delete call per family.
    pub async fn prune(&self, today: Date, keep_days: i64) -> Result<Vec<PruneResult>> {
        let mut results = Vec::new();

        for collection in Collection::ALL {
            let pattern = retention_pattern(&self.prefix, collection, today, keep_days)?;
            let expression = pattern.to_expression();

            info!(
                collection = %collection,
                keep_days,
                dry_run = self.dry_run,
                expression = %expression,
                "Pruning report indices"
            );

            if !self.dry_run {
                self.store
                    .delete_indices(&pattern.rendered())
                    .await
                    .with_context(|| format!("Failed to prune {} indices", collection))?;
            }

            results.push(PruneResult {
                collection,
                pattern,
                deleted: !self.dry_run,
            });
        }

        Ok(results)
    }
}
