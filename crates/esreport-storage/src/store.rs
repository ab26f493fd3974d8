use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Write side of a time-partitioned document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write `body` as document `id` into `index`, replacing any previous version.
    async fn index_document(&self, index: &str, id: &str, body: &Value) -> Result<()>;

    /// Delete the indices selected by `patterns`.
    ///
    /// Patterns are evaluated in order. A pattern prefixed with `-` removes
    /// its matches from the selection built so far. Patterns matching
    /// nothing are ignored.
    async fn delete_indices(&self, patterns: &[String]) -> Result<()>;

    /// Create or replace the index template `name`.
    async fn put_template(&self, name: &str, body: &Value) -> Result<()>;
}
