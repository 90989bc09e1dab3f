//! Application settings.
//!
//! Values are layered: built-in defaults, then the TOML file
//! (`config/budgetly.toml` unless `--config` points elsewhere), then
//! `BUDGETLY_*` environment variables, then command line flags.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "config/budgetly.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    #[default]
    Json,
    Sqlite,
}

impl StorageKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "json" => Some(Self::Json),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Storage {
    pub kind: StorageKind,
    /// Directory holding one `<key>.json` file per stored value.
    pub dir: String,
    /// SQLite database file, or `:memory:`.
    pub path: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            kind: StorageKind::Json,
            dir: "data".to_string(),
            path: "data/budgetly.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Persistence {
    /// Quiet period before a change is written, in milliseconds.
    pub debounce_ms: u64,
}

impl Persistence {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub storage: Storage,
    pub persistence: Persistence,
}

/// Command line values that win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<String>,
    pub level: Option<String>,
    pub storage: Option<StorageKind>,
    pub data_dir: Option<String>,
    pub database: Option<String>,
}

/// `BUDGETLY_<SECTION>__<KEY>`, e.g. `BUDGETLY_STORAGE__KIND=sqlite`.
fn environment() -> Environment {
    Environment::with_prefix("BUDGETLY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new(overrides: &Overrides) -> Result<Self> {
        Self::load(overrides, environment())
    }

    fn load(overrides: &Overrides, environment: Environment) -> Result<Self> {
        let config_path = overrides.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(environment)
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        settings.apply(overrides);
        Ok(settings)
    }

    fn apply(&mut self, overrides: &Overrides) {
        if let Some(level) = &overrides.level {
            self.app.level = level.clone();
        }
        if let Some(kind) = overrides.storage {
            self.storage.kind = kind;
        }
        if let Some(dir) = &overrides.data_dir {
            self.storage.dir = dir.clone();
        }
        if let Some(path) = &overrides.database {
            self.storage.kind = StorageKind::Sqlite;
            self.storage.path = path.clone();
        }
    }
}
