//! # App Settings
//!
//! The small preferences blob a register keeps between runs, stored as JSON
//! under a fixed key in a localStorage-style key/value store.
//!
//! ```text
//! key:   "pos-app-settings"
//! value: {"autoPrintReceipts":false,"soundEnabled":true,"darkMode":true}
//! ```
//!
//! A missing or unreadable blob yields the defaults; it is never an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

/// Storage key for the settings blob.
pub const SETTINGS_KEY: &str = "pos-app-settings";

/// Minimal string key/value store.
///
/// The in-memory implementation lives here; aura-register provides a file
/// backed one.
pub trait KeyValueStorage {
    type Error: std::error::Error;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub auto_print_receipts: bool,
    pub sound_enabled: bool,
    pub dark_mode: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            auto_print_receipts: false,
            sound_enabled: true,
            dark_mode: true,
        }
    }
}

/// Partial settings update; `None` keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingsPatch {
    pub auto_print_receipts: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub dark_mode: Option<bool>,
}

impl AppSettings {
    /// Reads the blob, falling back to defaults when absent or malformed.
    pub fn load<S: KeyValueStorage>(storage: &S) -> Result<Self, S::Error> {
        let Some(raw) = storage.get_item(SETTINGS_KEY)? else {
            return Ok(AppSettings::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring malformed settings blob");
            AppSettings::default()
        }))
    }

    pub fn save<S: KeyValueStorage>(&self, storage: &mut S) -> Result<(), S::Error> {
        // a struct of three bools always serialises
        let json = serde_json::to_string(self).unwrap_or_default();
        storage.set_item(SETTINGS_KEY, &json)
    }

    /// Merges `patch` into the stored settings and persists the result.
    pub fn update<S: KeyValueStorage>(
        storage: &mut S,
        patch: AppSettingsPatch,
    ) -> Result<Self, S::Error> {
        let mut settings = AppSettings::load(storage)?;
        settings.apply(patch);
        settings.save(storage)?;
        Ok(settings)
    }

    pub fn apply(&mut self, patch: AppSettingsPatch) {
        if let Some(v) = patch.auto_print_receipts {
            self.auto_print_receipts = v;
        }
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = patch.dark_mode {
            self.dark_mode = v;
        }
    }
}

// =============================================================================
// In-memory storage
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    type Error = std::convert::Infallible;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing_or_malformed() {
        let mut storage = MemoryStorage::new();
        assert_eq!(AppSettings::load(&storage).unwrap(), AppSettings::default());

        storage.set_item(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(AppSettings::load(&storage).unwrap(), AppSettings::default());
    }

    #[test]
    fn test_wire_shape() {
        let mut storage = MemoryStorage::new();
        AppSettings::default().save(&mut storage).unwrap();
        assert_eq!(
            storage.get_item(SETTINGS_KEY).unwrap().as_deref(),
            Some(r#"{"autoPrintReceipts":false,"soundEnabled":true,"darkMode":true}"#)
        );
    }

    #[test]
    fn test_partial_update_merges_and_persists() {
        let mut storage = MemoryStorage::new();
        let updated = AppSettings::update(
            &mut storage,
            AppSettingsPatch {
                auto_print_receipts: Some(true),
                ..AppSettingsPatch::default()
            },
        )
        .unwrap();
        assert!(updated.auto_print_receipts);
        assert!(updated.dark_mode);

        AppSettings::update(
            &mut storage,
            AppSettingsPatch {
                dark_mode: Some(false),
                ..AppSettingsPatch::default()
            },
        )
        .unwrap();
        let reloaded = AppSettings::load(&storage).unwrap();
        assert!(reloaded.auto_print_receipts);
        assert!(!reloaded.dark_mode);
        assert!(reloaded.sound_enabled);
    }
}
