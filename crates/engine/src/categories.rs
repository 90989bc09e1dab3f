//! Category registry.
//!
//! An insertion-ordered, case-sensitive set of category names. Entries are
//! never removed; the whole set is persisted after every addition.

use std::sync::Arc;

use crate::{
    LedgerError, Outcome, Persister,
    gateway::{Gateway, keys, load_json},
};

/// Seed used the first time the registry is opened.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Food",
    "Transport",
    "Shopping",
    "Bills",
    "Entertainment",
    "Other",
];

#[derive(Debug)]
pub struct CategoryRegistry {
    names: Vec<String>,
    persister: Arc<Persister>,
}

impl CategoryRegistry {
    /// Opens the registry stored under the `categories` key.
    ///
    /// A missing key seeds [`DEFAULT_CATEGORIES`] and persists them. An
    /// unreadable one falls back to the seed in memory only, leaving the
    /// stored value alone until the next addition.
    pub async fn load<G: Gateway>(gateway: &G, persister: Arc<Persister>) -> Self {
        let stored = load_json::<G, Vec<String>>(gateway, keys::CATEGORIES).await;
        let mut registry = Self {
            names: Vec::new(),
            persister,
        };

        match stored {
            Ok(Some(names)) => {
                for name in names {
                    registry.insert(&name);
                }
            }
            Ok(None) => {
                registry.seed();
                registry.persist();
            }
            Err(err) => {
                tracing::warn!("loading categories failed, using defaults: {err}");
                registry.seed();
            }
        }

        tracing::debug!(count = registry.names.len(), "categories loaded");
        registry
    }

    fn seed(&mut self) {
        for name in DEFAULT_CATEGORIES {
            self.insert(name);
        }
    }

    fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    fn persist(&self) {
        self.persister.schedule_json(keys::CATEGORIES, &self.names);
    }

    pub fn list(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    /// Adds `name` (trimmed) if it is not registered yet.
    pub fn add(&mut self, name: &str) -> Result<Outcome, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::InvalidCategory);
        }
        if !self.insert(name) {
            return Ok(Outcome::Unchanged);
        }
        tracing::debug!(category = name.trim(), "category added");
        self.persist();
        Ok(Outcome::Applied)
    }
}
