use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::Mutex;

use super::Gateway;
use crate::GatewayError;

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    writes: Vec<(String, String)>,
}

/// In-memory gateway.
///
/// Clones share the same storage, so a test can keep a handle while the
/// ledger owns another. Loads and saves can be made to fail on demand.
#[derive(Clone, Debug, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<Inner>>,
    fail_loads: Arc<AtomicBool>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway pre-populated with raw values.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let inner = Inner {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            writes: Vec::new(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            ..Self::default()
        }
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Current raw value for `key`.
    pub async fn value(&self, key: &str) -> Option<String> {
        self.inner.lock().await.values.get(key).cloned()
    }

    /// Every successful write to `key`, oldest first.
    pub async fn writes(&self, key: &str) -> Vec<String> {
        self.inner
            .lock()
            .await
            .writes
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl Gateway for MemoryGateway {
    async fn load(&self, key: &str) -> Result<Option<String>, GatewayError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(format!("load of {key} refused")));
        }
        Ok(self.inner.lock().await.values.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), GatewayError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(format!("save of {key} refused")));
        }
        let mut guard = self.inner.lock().await;
        guard.values.insert(key.to_string(), value.to_string());
        guard.writes.push((key.to_string(), value.to_string()));
        Ok(())
    }
}
