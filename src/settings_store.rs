//! Persistent addon settings store backed by a flat TOML document.

use std::path::Path;

use log::warn;
use toml_edit::{value, DocumentMut, Item, Value};

/// Host-provided persistent key/value settings access.
///
/// Reads never fail: absent keys resolve to an empty string or `false`, the
/// same way the host plugin framework behaves.
pub trait SettingsStore {
    /// Returns the setting value as a string, empty when absent.
    fn get_string(&self, id: &str) -> String;
    /// Returns the setting value as a bool, `false` when absent or non-boolean.
    fn get_bool(&self, id: &str) -> bool;
    /// Writes a string setting value back to the store.
    fn set_string(&mut self, id: &str, next_value: &str);
}

/// File-backed settings store over a flat TOML document.
///
/// The document is kept as parsed `toml_edit` state so writes preserve the
/// comments and key order of the on-disk file.
#[derive(Debug, Clone, Default)]
pub struct TomlSettingsStore {
    document: DocumentMut,
}

fn set_value_preserving_decor(document: &mut DocumentMut, key: &str, item: Item) {
    let root = document.as_table_mut();
    let existing_value_decor = root
        .get(key)
        .and_then(|current| current.as_value().map(|current| current.decor().clone()));
    root[key] = item;
    if let Some(existing_value_decor) = existing_value_decor {
        if let Some(next_value) = root[key].as_value_mut() {
            *next_value.decor_mut() = existing_value_decor;
        }
    }
}

impl TomlSettingsStore {
    /// Loads the settings file, degrading to an empty store when the file is
    /// missing or unparseable. The host may never have written settings yet.
    pub fn load(path: &Path) -> Self {
        let settings_text = match std::fs::read_to_string(path) {
            Ok(settings_text) => settings_text,
            Err(error) => {
                warn!(
                    "Failed to read settings file {}. Starting from empty settings. error={}",
                    path.display(),
                    error
                );
                return Self::default();
            }
        };
        Self::from_toml_str(&settings_text).unwrap_or_else(|error| {
            warn!(
                "Failed to parse settings file {}. Starting from empty settings. error={}",
                path.display(),
                error
            );
            Self::default()
        })
    }

    /// Parses a settings store from TOML text.
    pub fn from_toml_str(settings_text: &str) -> Result<Self, String> {
        let document = settings_text
            .parse::<DocumentMut>()
            .map_err(|error| format!("failed to parse settings as TOML document: {}", error))?;
        Ok(Self { document })
    }

    /// Serializes the store back to TOML text, comments intact.
    pub fn to_toml_string(&self) -> String {
        self.document.to_string()
    }

    /// Persists the store to disk.
    pub fn persist(&self, path: &Path) -> Result<(), String> {
        std::fs::write(path, self.to_toml_string())
            .map_err(|error| format!("failed to persist settings to {}: {}", path.display(), error))
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get_string(&self, id: &str) -> String {
        match self.document.get(id).and_then(Item::as_value) {
            Some(Value::String(formatted)) => formatted.value().clone(),
            Some(other) => other.to_string().trim().to_string(),
            None => String::new(),
        }
    }

    fn get_bool(&self, id: &str) -> bool {
        match self.document.get(id).and_then(Item::as_value) {
            Some(Value::Boolean(formatted)) => *formatted.value(),
            // The host occasionally stores booleans as "true"/"false" strings.
            Some(Value::String(formatted)) => formatted.value().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn set_string(&mut self, id: &str, next_value: &str) {
        set_value_preserving_decor(&mut self.document, id, value(next_value));
    }
}

#[cfg(test)]
mod tests {
    use super::{SettingsStore, TomlSettingsStore};

    #[test]
    fn test_absent_keys_read_as_empty_defaults() {
        let store = TomlSettingsStore::default();
        assert_eq!(store.get_string("languageDetails"), "");
        assert!(!store.get_bool("verboselog"));
    }

    #[test]
    fn test_get_string_and_bool_read_typed_values() {
        let store = TomlSettingsStore::from_toml_str(
            "languageDetails = \"zh-CN\"\nverboselog = true\nenab_trailer = \"TRUE\"\n",
        )
        .expect("settings text should parse");
        assert_eq!(store.get_string("languageDetails"), "zh-CN");
        assert!(store.get_bool("verboselog"));
        assert!(store.get_bool("enab_trailer"));
        assert!(!store.get_bool("languageDetails"));
    }

    #[test]
    fn test_non_string_scalars_read_as_display_text() {
        let store = TomlSettingsStore::from_toml_str("lastUpdated = 1756000000\n")
            .expect("settings text should parse");
        assert_eq!(store.get_string("lastUpdated"), "1756000000");
    }

    #[test]
    fn test_set_string_preserves_comments() {
        let mut store = TomlSettingsStore::from_toml_str(
            "# image cache state\noriginalUrl = \"old\" # refreshed monthly\n",
        )
        .expect("settings text should parse");
        store.set_string("originalUrl", "https://image.tmdb.org/t/p/original");
        let serialized = store.to_toml_string();
        assert!(serialized.contains("# image cache state"));
        assert!(serialized.contains("# refreshed monthly"));
        assert_eq!(
            store.get_string("originalUrl"),
            "https://image.tmdb.org/t/p/original"
        );
    }

    #[test]
    fn test_set_string_inserts_missing_key() {
        let mut store = TomlSettingsStore::default();
        store.set_string("previewUrl", "https://image.tmdb.org/t/p/w780");
        assert_eq!(
            store.get_string("previewUrl"),
            "https://image.tmdb.org/t/p/w780"
        );
    }
}
