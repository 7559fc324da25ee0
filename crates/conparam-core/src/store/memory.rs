// # Parameter Store
//
// In-memory mapping from parameter name to current value.
//
// ## Concurrency
//
// - Every read, upsert and bulk merge takes the map lock, so no caller ever
//   observes a partially applied merge.
// - A revision counter (a `watch` channel) is bumped after every mutation.
//   Readers waiting for a name subscribe before they look, so a mutation that
//   lands between the look and the wait still wakes them.
//
// ## Lifecycle
//
// - Seeded with defaults at construction
// - Keys are only ever inserted or overwritten, never removed
// - No persistence: state is lost with the process

use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::{RwLock, watch};

/// Shared parameter store
///
/// Stores parameters in a HashMap protected by a RwLock. Wrap it in an
/// `Arc` to share it between the receive loop and callers.
///
/// # Example
///
/// ```rust,no_run
/// use conparam_core::store::ParameterStore;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() {
///     let store = ParameterStore::with_defaults([("gain".to_string(), json!(0.5))]);
///
///     store.set("offset", json!(3)).await;
///     assert_eq!(store.get("offset").await, Some(json!(3)));
///
///     // Resolves immediately: the key was seeded
///     assert_eq!(store.wait_for("gain").await, json!(0.5));
/// }
/// ```
#[derive(Debug)]
pub struct ParameterStore {
    inner: RwLock<HashMap<String, Value>>,
    revision: watch::Sender<u64>,
}

impl ParameterStore {
    /// Create a new empty parameter store
    pub fn new() -> Self {
        Self::with_defaults(std::iter::empty())
    }

    /// Create a store seeded with default parameters
    pub fn with_defaults(defaults: impl IntoIterator<Item = (String, Value)>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: RwLock::new(defaults.into_iter().collect()),
            revision,
        }
    }

    /// Get the current value of a parameter without waiting
    ///
    /// Returns `None` if the name is not present.
    pub async fn get(&self, name: &str) -> Option<Value> {
        self.inner.read().await.get(name).cloned()
    }

    /// Insert or overwrite a single parameter
    pub async fn set(&self, name: &str, value: Value) {
        {
            let mut guard = self.inner.write().await;
            guard.insert(name.to_string(), value);
        }
        self.bump();
    }

    /// Insert or overwrite every parameter of `updates` in one critical section
    ///
    /// An empty mapping is a no-op and does not wake waiters.
    pub async fn merge(&self, updates: Map<String, Value>) {
        if updates.is_empty() {
            return;
        }
        {
            let mut guard = self.inner.write().await;
            guard.extend(updates);
        }
        self.bump();
    }

    /// Wait until `name` is present, then return its value
    ///
    /// There is no deadline; wrap in `tokio::time::timeout` to bound it.
    pub async fn wait_for(&self, name: &str) -> Value {
        let mut revision = self.revision.subscribe();
        loop {
            if let Some(value) = self.get(name).await {
                return value;
            }
            // The sender is owned by `self`, so this only errors once the store is gone
            let _ = revision.changed().await;
        }
    }

    /// Check whether a parameter is present
    pub async fn contains(&self, name: &str) -> bool {
        self.inner.read().await.contains_key(name)
    }

    /// Get the number of parameters in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// List all parameter names
    pub async fn names(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    /// Copy of every parameter, taken under a single read lock
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.read().await.clone()
    }

    /// Number of mutations applied since construction
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
