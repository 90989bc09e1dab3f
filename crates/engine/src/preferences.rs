//! Onboarding flag, theme mode and interface language.
//!
//! The flag and the theme live under their own storage keys. The language is
//! kept in the `userPreferences` record together with the currency and theme
//! that were current when it was written.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Currency, Outcome, Persister,
    gateway::{Gateway, keys, load_json, load_text},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Tr,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Tr, Language::En];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tr => "tr",
            Self::En => "en",
        }
    }

    /// Name of the language in the language itself.
    pub fn label(self) -> &'static str {
        match self {
            Self::Tr => "Türkçe",
            Self::En => "English",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tr" => Some(Self::Tr),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

/// Stored form of `userPreferences`. Only the language is read back; currency
/// and theme have keys of their own.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Profile {
    #[serde(default)]
    language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<ThemeMode>,
}

#[derive(Debug)]
pub struct Preferences {
    onboarding_completed: bool,
    theme_mode: ThemeMode,
    language: Language,
    persister: Arc<Persister>,
}

impl Preferences {
    /// Loads all values in parallel; failures fall back to the defaults.
    pub async fn load<G: Gateway>(gateway: &G, persister: Arc<Persister>) -> Self {
        let (onboarding, theme, profile) = tokio::join!(
            load_json::<G, bool>(gateway, keys::ONBOARDING_COMPLETED),
            load_text(gateway, keys::THEME_MODE),
            load_json::<G, Profile>(gateway, keys::USER_PREFERENCES),
        );

        let onboarding_completed = onboarding.unwrap_or_else(|err| {
            tracing::warn!("loading onboarding flag failed: {err}");
            None
        });
        let theme_mode = match theme {
            Ok(Some(raw)) => ThemeMode::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(theme = %raw, "unknown theme mode, using default");
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(err) => {
                tracing::warn!("loading theme mode failed: {err}");
                ThemeMode::default()
            }
        };

        let profile = profile.unwrap_or_else(|err| {
            tracing::warn!("loading user preferences failed: {err}");
            None
        });

        Self {
            onboarding_completed: onboarding_completed.unwrap_or(false),
            theme_mode,
            language: profile.unwrap_or_default().language,
            persister,
        }
    }

    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme_mode
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Records the onboarding choices, then marks onboarding as done.
    pub fn complete_onboarding(&mut self, currency: Currency) -> Outcome {
        if self.onboarding_completed {
            return Outcome::Unchanged;
        }
        self.save_profile(currency);
        self.onboarding_completed = true;
        self.persister
            .schedule_json(keys::ONBOARDING_COMPLETED, &self.onboarding_completed);
        Outcome::Applied
    }

    pub fn set_language(&mut self, language: Language, currency: Currency) -> Outcome {
        if self.language == language {
            return Outcome::Unchanged;
        }
        self.language = language;
        self.save_profile(currency);
        Outcome::Applied
    }

    fn save_profile(&self, currency: Currency) {
        let profile = Profile {
            language: self.language,
            currency: Some(currency),
            theme: Some(self.theme_mode),
        };
        self.persister.schedule_json(keys::USER_PREFERENCES, &profile);
    }

    pub fn set_theme(&mut self, mode: ThemeMode) -> Outcome {
        if self.theme_mode == mode {
            return Outcome::Unchanged;
        }
        self.theme_mode = mode;
        self.persister.schedule_json(keys::THEME_MODE, &mode);
        Outcome::Applied
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.set_theme(self.theme_mode.toggled());
        self.theme_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryGateway, PersistOptions};

    fn persister(gateway: &MemoryGateway) -> Arc<Persister> {
        Arc::new(Persister::spawn(
            Arc::new(gateway.clone()),
            PersistOptions::default(),
        ))
    }

    #[tokio::test]
    async fn defaults_when_nothing_is_stored() {
        let gateway = MemoryGateway::new();
        let prefs = Preferences::load(&gateway, persister(&gateway)).await;
        assert!(!prefs.onboarding_completed());
        assert_eq!(prefs.theme_mode(), ThemeMode::Light);
        assert_eq!(prefs.language(), Language::Tr);
    }

    #[tokio::test]
    async fn reads_bare_and_json_values() {
        let gateway = MemoryGateway::with_values([
            (keys::ONBOARDING_COMPLETED, "true"),
            (keys::THEME_MODE, "dark"),
        ]);
        let prefs = Preferences::load(&gateway, persister(&gateway)).await;
        assert!(prefs.onboarding_completed());
        assert_eq!(prefs.theme_mode(), ThemeMode::Dark);
    }

    #[tokio::test]
    async fn changes_are_persisted_per_key() {
        let gateway = MemoryGateway::new();
        let persister = persister(&gateway);
        let mut prefs = Preferences::load(&gateway, persister.clone()).await;

        assert_eq!(prefs.complete_onboarding(Currency::Try), Outcome::Applied);
        assert_eq!(prefs.complete_onboarding(Currency::Try), Outcome::Unchanged);
        assert_eq!(prefs.toggle_theme(), ThemeMode::Dark);
        persister.flush().await.unwrap();

        assert_eq!(
            gateway.value(keys::ONBOARDING_COMPLETED).await.as_deref(),
            Some("true")
        );
        assert_eq!(
            gateway.value(keys::THEME_MODE).await.as_deref(),
            Some("\"dark\"")
        );
    }

    #[tokio::test]
    async fn onboarding_records_language_currency_and_theme() {
        let gateway = MemoryGateway::new();
        let persister = persister(&gateway);
        let mut prefs = Preferences::load(&gateway, persister.clone()).await;

        assert_eq!(prefs.set_language(Language::En, Currency::Usd), Outcome::Applied);
        assert_eq!(prefs.set_language(Language::En, Currency::Usd), Outcome::Unchanged);
        prefs.set_theme(ThemeMode::Dark);
        prefs.complete_onboarding(Currency::Eur);
        persister.flush().await.unwrap();

        assert_eq!(
            gateway.value(keys::USER_PREFERENCES).await.as_deref(),
            Some(r#"{"language":"en","currency":"EUR","theme":"dark"}"#)
        );
        let reloaded = Preferences::load(&gateway, persister.clone()).await;
        assert_eq!(reloaded.language(), Language::En);
    }

    #[tokio::test]
    async fn reads_language_from_stored_preferences_record() {
        let gateway = MemoryGateway::with_values([(
            keys::USER_PREFERENCES,
            r#"{"language":"en","currency":"TRY","theme":"light"}"#,
        )]);
        let prefs = Preferences::load(&gateway, persister(&gateway)).await;
        assert_eq!(prefs.language(), Language::En);

        let broken =
            MemoryGateway::with_values([(keys::USER_PREFERENCES, r#"{"language":"de"}"#)]);
        let prefs = Preferences::load(&broken, persister(&broken)).await;
        assert_eq!(prefs.language(), Language::Tr);
    }
}
