//! Background save queue.
//!
//! Each storage key gets one writer task fed by a `watch` channel. Scheduling
//! a save replaces whatever is pending for that key, so a burst of changes
//! ends up as a single write of the newest state, and a key never has more
//! than one write in flight. Failed writes are logged and not retried; the
//! next change for the key writes the full state again.

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::watch;

use crate::{
    LedgerError,
    gateway::{Gateway, keys},
};

/// Tuning for the save queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PersistOptions {
    /// Quiet period a writer waits for before writing. Every change within
    /// the period restarts it, so a steady stream of changes is written once
    /// it stops.
    pub debounce: Duration,
}

#[derive(Clone, Debug, Default)]
struct Pending {
    seq: u64,
    payload: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct Completed {
    seq: u64,
    error: Option<String>,
}

#[derive(Debug)]
struct KeyWriter {
    pending: watch::Sender<Pending>,
    completed: watch::Receiver<Completed>,
}

/// Fire-and-forget persistence with one serialized writer per key.
#[derive(Debug)]
pub struct Persister {
    writers: HashMap<&'static str, KeyWriter>,
}

impl Persister {
    /// Spawns a writer for every ledger key.
    ///
    /// Must be called from within a Tokio runtime. Writers stop once the
    /// `Persister` is dropped and their last pending value has been written.
    pub fn spawn<G: Gateway>(gateway: Arc<G>, options: PersistOptions) -> Self {
        let writers = keys::ALL
            .into_iter()
            .map(|key| {
                let (pending_tx, pending_rx) = watch::channel(Pending::default());
                let (completed_tx, completed_rx) = watch::channel(Completed::default());
                tokio::spawn(run_writer(
                    gateway.clone(),
                    key,
                    pending_rx,
                    completed_tx,
                    options.debounce,
                ));
                (
                    key,
                    KeyWriter {
                        pending: pending_tx,
                        completed: completed_rx,
                    },
                )
            })
            .collect();

        Self { writers }
    }

    /// Queues `payload` as the next value of `key`, replacing any value that
    /// has not been written yet.
    pub fn schedule(&self, key: &str, payload: String) {
        let Some(writer) = self.writers.get(key) else {
            tracing::error!(key, "no writer for key, dropping save");
            return;
        };
        writer.pending.send_modify(|pending| {
            pending.seq += 1;
            pending.payload = Some(payload);
        });
    }

    /// Serializes `value` and queues it for `key`.
    pub fn schedule_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(payload) => self.schedule(key, payload),
            Err(err) => tracing::error!(key, "cannot serialize value: {err}"),
        }
    }

    /// Waits until every save scheduled so far has been attempted.
    ///
    /// Returns the failure of the latest write if one of the keys could not
    /// be saved.
    pub async fn flush(&self) -> Result<(), LedgerError> {
        let mut failure = None;

        for (key, writer) in &self.writers {
            let target = writer.pending.borrow().seq;
            if target == 0 {
                continue;
            }

            let mut completed = writer.completed.clone();
            let outcome = completed
                .wait_for(|done| done.seq >= target)
                .await
                .map(|done| done.error.clone());

            let reason = match outcome {
                Ok(None) => continue,
                Ok(Some(reason)) => reason,
                Err(_) => "writer stopped".to_string(),
            };
            failure = Some(LedgerError::SaveFailed {
                key: key.to_string(),
                reason,
            });
        }

        failure.map_or(Ok(()), Err)
    }
}

async fn run_writer<G: Gateway>(
    gateway: Arc<G>,
    key: &'static str,
    mut pending: watch::Receiver<Pending>,
    completed: watch::Sender<Completed>,
    debounce: Duration,
) {
    while pending.changed().await.is_ok() {
        // Restart the wait for every change that lands during it.
        while !debounce.is_zero() {
            pending.mark_unchanged();
            tokio::time::sleep(debounce).await;
            if !matches!(pending.has_changed(), Ok(true)) {
                break;
            }
        }

        let Pending { seq, payload } = pending.borrow_and_update().clone();
        let Some(payload) = payload else {
            continue;
        };

        let error = match gateway.save(key, &payload).await {
            Ok(()) => {
                tracing::debug!(key, seq, bytes = payload.len(), "saved");
                None
            }
            Err(err) => {
                tracing::error!(key, seq, "save failed: {err}");
                Some(err.to_string())
            }
        };
        completed.send_replace(Completed { seq, error });
    }

    tracing::debug!(key, "writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryGateway;

    #[tokio::test]
    async fn burst_of_changes_is_written_once() {
        let gateway = MemoryGateway::new();
        let persister = Persister::spawn(Arc::new(gateway.clone()), PersistOptions::default());

        persister.schedule(keys::THEME_MODE, "\"light\"".to_string());
        persister.schedule(keys::THEME_MODE, "\"dark\"".to_string());
        persister.schedule(keys::THEME_MODE, "\"light\"".to_string());
        persister.flush().await.unwrap();

        assert_eq!(gateway.writes(keys::THEME_MODE).await, vec!["\"light\""]);
    }

    #[tokio::test]
    async fn later_change_is_written_after_earlier_one() {
        let gateway = MemoryGateway::new();
        let persister = Persister::spawn(Arc::new(gateway.clone()), PersistOptions::default());

        persister.schedule(keys::CATEGORIES, "[\"A\"]".to_string());
        persister.flush().await.unwrap();
        persister.schedule(keys::CATEGORIES, "[\"A\",\"B\"]".to_string());
        persister.flush().await.unwrap();

        assert_eq!(
            gateway.writes(keys::CATEGORIES).await,
            vec!["[\"A\"]", "[\"A\",\"B\"]"]
        );
        assert_eq!(
            gateway.value(keys::CATEGORIES).await.as_deref(),
            Some("[\"A\",\"B\"]")
        );
    }

    #[tokio::test]
    async fn flush_reports_failed_write() {
        let gateway = MemoryGateway::new();
        gateway.fail_saves(true);
        let persister = Persister::spawn(Arc::new(gateway.clone()), PersistOptions::default());

        persister.schedule(keys::TRANSACTIONS, "[]".to_string());
        let err = persister.flush().await.unwrap_err();
        assert!(matches!(err, LedgerError::SaveFailed { ref key, .. } if key == "transactions"));

        gateway.fail_saves(false);
        persister.schedule(keys::TRANSACTIONS, "[]".to_string());
        persister.flush().await.unwrap();
    }

    #[tokio::test]
    async fn flush_without_saves_returns_immediately() {
        let persister =
            Persister::spawn(Arc::new(MemoryGateway::new()), PersistOptions::default());
        persister.flush().await.unwrap();
    }

    #[tokio::test]
    async fn debounce_coalesces_across_yields() {
        let gateway = MemoryGateway::new();
        let persister = Persister::spawn(
            Arc::new(gateway.clone()),
            PersistOptions {
                debounce: Duration::from_millis(20),
            },
        );

        persister.schedule(keys::SELECTED_CURRENCY, "\"EUR\"".to_string());
        tokio::task::yield_now().await;
        persister.schedule(keys::SELECTED_CURRENCY, "\"TRY\"".to_string());
        persister.flush().await.unwrap();

        assert_eq!(
            gateway.writes(keys::SELECTED_CURRENCY).await,
            vec!["\"TRY\""]
        );
    }

    #[tokio::test]
    async fn debounce_restarts_on_each_change() {
        let gateway = MemoryGateway::new();
        let persister = Persister::spawn(
            Arc::new(gateway.clone()),
            PersistOptions {
                debounce: Duration::from_millis(200),
            },
        );

        persister.schedule(keys::THEME_MODE, "\"dark\"".to_string());
        tokio::time::sleep(Duration::from_millis(120)).await;
        persister.schedule(keys::THEME_MODE, "\"light\"".to_string());
        tokio::time::sleep(Duration::from_millis(120)).await;

        // A fixed delay from the first change would have written by now.
        assert!(gateway.writes(keys::THEME_MODE).await.is_empty());

        persister.flush().await.unwrap();
        assert_eq!(gateway.writes(keys::THEME_MODE).await, vec!["\"light\""]);
    }
}
