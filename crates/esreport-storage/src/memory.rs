//! In-process document store

use async_trait::async_trait;
use glob::Pattern;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, StorageError};
use crate::store::DocumentStore;

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, BTreeMap<String, Value>>,
    templates: BTreeMap<String, Value>,
    deletes: Vec<Vec<String>>,
    unavailable: bool,
}

/// [`DocumentStore`] kept in memory, with the same pattern semantics as the
/// cluster.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every later call fail as if the cluster were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Create an empty index
    pub fn create_index(&self, name: &str) {
        self.state().indices.entry(name.to_string()).or_default();
    }

    pub fn indices(&self) -> Vec<String> {
        self.state().indices.keys().cloned().collect()
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.state()
            .indices
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub fn documents(&self, index: &str) -> Vec<Value> {
        self.state()
            .indices
            .get(index)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total documents across all indices
    pub fn document_count(&self) -> usize {
        self.state().indices.values().map(BTreeMap::len).sum()
    }

    pub fn template(&self, name: &str) -> Option<Value> {
        self.state().templates.get(name).cloned()
    }

    /// Pattern lists passed to every delete call, in call order
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.state().deletes.clone()
    }

    fn check_available(state: &State) -> Result<()> {
        if state.unavailable {
            return Err(StorageError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

/// Resolve ordered include/exclude patterns against existing index names
fn select<'a, I>(names: I, patterns: &[String]) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = &'a String> + Clone,
{
    let mut selected = BTreeSet::new();

    for raw in patterns {
        let (exclude, glob) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.as_str()),
        };
        let pattern = Pattern::new(glob).map_err(|_| StorageError::InvalidPattern(raw.clone()))?;

        for name in names.clone() {
            if !pattern.matches(name) {
                continue;
            }
            if exclude {
                selected.remove(name);
            } else {
                selected.insert(name.clone());
            }
        }
    }

    Ok(selected)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn index_document(&self, index: &str, id: &str, body: &Value) -> Result<()> {
        let mut state = self.state();
        Self::check_available(&state)?;

        state
            .indices
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), body.clone());
        Ok(())
    }

    async fn delete_indices(&self, patterns: &[String]) -> Result<()> {
        let mut state = self.state();
        Self::check_available(&state)?;

        let doomed = select(state.indices.keys(), patterns)?;
        state.indices.retain(|name, _| !doomed.contains(name));
        state.deletes.push(patterns.to_vec());
        Ok(())
    }

    async fn put_template(&self, name: &str, body: &Value) -> Result<()> {
        let mut state = self.state();
        Self::check_available(&state)?;

        state.templates.insert(name.to_string(), body.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for name in names {
            store.create_index(name);
        }
        store
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_index_and_overwrite() {
        let store = MemoryStore::new();
        store.index_document("idx", "1", &json!({"v": 1})).await.unwrap();
        store.index_document("idx", "1", &json!({"v": 2})).await.unwrap();

        assert_eq!(store.document("idx", "1"), Some(json!({"v": 2})));
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_exclusions() {
        let store = seeded(&[
            "p_reports-jobs-2020.01.13",
            "p_reports-jobs-2020.01.14",
            "p_reports-jobs-2019.12.31",
            "p_reports-requests-2020.01.14",
        ]);

        store
            .delete_indices(&patterns(&[
                "p_reports-jobs-*",
                "-p_reports-jobs-2020.01.*",
            ]))
            .await
            .unwrap();

        assert_eq!(
            store.indices(),
            vec![
                "p_reports-jobs-2020.01.13",
                "p_reports-jobs-2020.01.14",
                "p_reports-requests-2020.01.14",
            ]
        );
    }

    #[tokio::test]
    async fn test_include_after_exclude_reselects() {
        let store = seeded(&["a-1", "a-2"]);
        store
            .delete_indices(&patterns(&["a-*", "-a-*", "a-2"]))
            .await
            .unwrap();

        assert_eq!(store.indices(), vec!["a-1"]);
    }

    #[tokio::test]
    async fn test_delete_of_missing_indices_is_ignored() {
        let store = seeded(&["keep"]);
        store.delete_indices(&patterns(&["nothing-*"])).await.unwrap();

        assert_eq!(store.indices(), vec!["keep"]);
        assert_eq!(store.delete_calls(), vec![patterns(&["nothing-*"])]);
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let store = seeded(&["a"]);
        let err = store.delete_indices(&patterns(&["a[", "b"])).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPattern(_)));
        assert_eq!(store.indices(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(store.put_template("t", &json!({})).await.is_err());
        assert!(store.index_document("i", "1", &json!({})).await.is_err());

        store.set_unavailable(false);
        store.put_template("t", &json!({"order": 10})).await.unwrap();
        assert_eq!(store.template("t"), Some(json!({"order": 10})));
    }
}
