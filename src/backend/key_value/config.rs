//! Key-value settings
//!
//! The `key_value` table: `instance` (default `polyquery`) and `key`, the
//! attribute used as entry key (default `id`).

use serde::Deserialize;

use crate::config::{ConfigError, Settings};

use super::converter::{KeyValueConverter, DEFAULT_KEY_ATTRIBUTE};

/// Settings for one map instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyValueSettings {
    #[serde(default = "default_instance")]
    pub instance: String,
    #[serde(rename = "key", default = "default_key_attribute")]
    pub key_attribute: String,
}

fn default_instance() -> String {
    "polyquery".to_string()
}

fn default_key_attribute() -> String {
    DEFAULT_KEY_ATTRIBUTE.to_string()
}

impl Default for KeyValueSettings {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            key_attribute: default_key_attribute(),
        }
    }
}

impl KeyValueSettings {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.section("key_value")
    }

    pub fn converter(&self) -> KeyValueConverter {
        KeyValueConverter::new(self.key_attribute.clone())
    }
}
