//! Durable key-value storage behind the ledger.
//!
//! A [`Gateway`] only moves opaque text in and out; every value the ledger
//! writes is JSON. Three implementations ship with the engine:
//!
//! - [`MemoryGateway`]: process-local map, used by tests and the `memory`
//!   storage setting.
//! - [`JsonFileGateway`]: one `<key>.json` file per key in a directory.
//! - [`SqliteGateway`]: a `kv_store` table through sea-orm.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::{GatewayError, LedgerError};

pub use json_file::JsonFileGateway;
pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

mod json_file;
pub mod kv_store;
mod memory;
mod sqlite;

/// Storage keys used by the ledger.
pub mod keys {
    pub const TRANSACTIONS: &str = "transactions";
    pub const SELECTED_CURRENCY: &str = "selectedCurrency";
    pub const CATEGORIES: &str = "categories";
    pub const ONBOARDING_COMPLETED: &str = "hasCompletedOnboarding";
    pub const THEME_MODE: &str = "themeMode";
    /// Snapshot of the choices made during onboarding.
    pub const USER_PREFERENCES: &str = "userPreferences";

    pub const ALL: [&str; 6] = [
        TRANSACTIONS,
        SELECTED_CURRENCY,
        CATEGORIES,
        ONBOARDING_COMPLETED,
        THEME_MODE,
        USER_PREFERENCES,
    ];
}

/// Key-value storage contract.
///
/// `load` returns `Ok(None)` when the key has never been written. Writes to
/// the same key are serialized by the caller (see [`crate::Persister`]), so
/// implementations only need last-write-wins semantics.
pub trait Gateway: Send + Sync + 'static {
    fn load(&self, key: &str)
    -> impl Future<Output = Result<Option<String>, GatewayError>> + Send;

    fn save(&self, key: &str, value: &str)
    -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Loads and decodes a JSON value.
pub(crate) async fn load_json<G, T>(gateway: &G, key: &str) -> Result<Option<T>, LedgerError>
where
    G: Gateway,
    T: DeserializeOwned,
{
    match gateway.load(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Loads a string value stored either as a JSON string (`"USD"`) or as bare
/// text (`USD`).
pub(crate) async fn load_text<G: Gateway>(
    gateway: &G,
    key: &str,
) -> Result<Option<String>, LedgerError> {
    let raw = gateway.load(key).await?;
    Ok(raw.map(|raw| {
        serde_json::from_str::<String>(&raw).unwrap_or_else(|_| raw.trim().to_string())
    }))
}
