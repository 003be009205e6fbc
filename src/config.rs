//! Settings
//!
//! Layered settings built with the `config` crate, later layers winning: a
//! JSON file, environment variables, and an explicit map.
//!
//! Keys are lowercase and dot-separated (`wide_column.port`). Lists are
//! either JSON arrays or numbered keys (`wide_column.host.1`). Environment
//! variables map `POLYQUERY_WIDE_COLUMN__HOST__1` to `wide_column.host.1`.
//!
//! Settings parametrize construction only; nothing here is consulted while a
//! query runs.

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File, FileFormat, Map};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};

/// Default environment prefix
pub const ENV_PREFIX: &str = "POLYQUERY";

/// Settings loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("missing required setting {0}")]
    Missing(String),

    #[error("cannot build settings: {0}")]
    Build(#[source] ::config::ConfigError),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_IO",
            ConfigError::Malformed { .. } => "CONFIG_MALFORMED",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::Missing(_) => "CONFIG_MISSING",
            ConfigError::Build(_) => "CONFIG_BUILD",
        }
    }

    fn invalid(key: &str, err: ::config::ConfigError) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Resolved settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    inner: Config,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit settings; keys are lowercased
    pub fn from_map<K, V, I>(entries: I) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut builder = Config::builder();
        for (key, value) in entries {
            let key = key.into().to_ascii_lowercase();
            builder = builder
                .set_override(key.as_str(), value.into())
                .map_err(|e| ConfigError::invalid(&key, e))?;
        }
        let inner = builder.build().map_err(ConfigError::Build)?;
        Ok(Self { inner })
    }

    /// Settings from the process environment
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let inner = Config::builder()
            .add_source(environment(prefix))
            .build()
            .map_err(ConfigError::Build)?;
        Ok(Self { inner })
    }

    /// Settings from an explicit list of environment-style variables
    pub fn from_vars<I>(prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Map<String, String> = vars.into_iter().collect();
        let inner = Config::builder()
            .add_source(environment(prefix).source(Some(vars)))
            .build()
            .map_err(ConfigError::Build)?;
        Ok(Self { inner })
    }

    /// Settings from a JSON document on disk
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        std::fs::metadata(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let inner = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            .build()
            .map_err(|e| ConfigError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self { inner })
    }

    /// Overlays `other` on top of `self`
    pub fn merge(self, other: Settings) -> Result<Self, ConfigError> {
        let inner = Config::builder()
            .add_source(self.inner)
            .add_source(other.inner)
            .build()
            .map_err(ConfigError::Build)?;
        Ok(Self { inner })
    }

    /// File, then environment, then explicit values
    pub fn resolve(
        file: Option<&Path>,
        env_prefix: &str,
        explicit: Settings,
    ) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::new(),
        };
        let resolved = base.merge(Self::from_env(env_prefix)?)?.merge(explicit)?;

        let source = file.map(|p| p.display().to_string()).unwrap_or_default();
        log_event_with_fields(
            Event::SettingsLoaded,
            &[("file", source.as_str()), ("env_prefix", env_prefix)],
        );
        Ok(resolved)
    }

    /// Scalar value rendered as a string
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get_string(key).ok()
    }

    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    /// Typed lookup; `Ok(None)` when the key is absent
    pub fn parse<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.inner.get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(::config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(ConfigError::invalid(key, e)),
        }
    }

    /// Deserializes the table under `key`; the default when it is absent
    pub fn section<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, ConfigError> {
        Ok(self.parse(key)?.unwrap_or_default())
    }

    /// Values of a list setting: a scalar, an array, or numbered children
    /// (`prefix.1`, `prefix.2`, ...) in numeric order
    pub fn enumerate(&self, prefix: &str) -> Vec<String> {
        if let Ok(value) = self.inner.get_string(prefix) {
            return vec![value];
        }
        if let Ok(items) = self.inner.get_array(prefix) {
            return items
                .into_iter()
                .filter_map(|item| item.into_string().ok())
                .collect();
        }
        let Ok(table) = self.inner.get_table(prefix) else {
            return Vec::new();
        };

        let mut numbered: Vec<(u64, String)> = table
            .into_iter()
            .filter_map(|(key, value)| {
                let index = key.parse::<u64>().ok()?;
                Some((index, value.into_string().ok()?))
            })
            .collect();
        numbered.sort_by_key(|(index, _)| *index);
        numbered.into_iter().map(|(_, value)| value).collect()
    }
}

fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Engine-wide settings, read from the `engine` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rows requested per fetch; 0 means one fetch on stateful backends
    /// (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page_size() -> u64 {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl EngineConfig {
    pub fn with_page_size(page_size: u64) -> Self {
        Self { page_size }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.section("engine")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_key_mapping() {
        let settings = Settings::from_vars(
            "POLYQUERY",
            vec![
                ("POLYQUERY_WIDE_COLUMN__HOST__1".to_string(), "10.0.0.1".to_string()),
                ("POLYQUERY_ENGINE__PAGE_SIZE".to_string(), "7".to_string()),
                ("OTHER_THING".to_string(), "x".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(settings.get("wide_column.host.1").as_deref(), Some("10.0.0.1"));
        assert_eq!(settings.enumerate("wide_column.host"), vec!["10.0.0.1"]);
        assert_eq!(settings.parse::<u64>("engine.page_size").unwrap(), Some(7));
        assert_eq!(settings.get("other_thing"), None);
        assert_eq!(settings.get("thing"), None);
    }

    #[test]
    fn test_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"document": {{"host": ["a:9200", "b:9200"], "index": "people"}}, "engine": {{"page_size": 50}}}}"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.enumerate("document.host"), vec!["a:9200", "b:9200"]);
        assert_eq!(settings.get("document.index").as_deref(), Some("people"));
        assert_eq!(settings.get("engine.page_size").as_deref(), Some("50"));
        assert_eq!(EngineConfig::from_settings(&settings).unwrap().page_size, 50);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = Settings::from_file(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_MALFORMED");
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_file(Path::new("/nonexistent/polyquery.json")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_IO");
    }

    #[test]
    fn test_merge_precedence() {
        let file = Settings::from_map([("a", "file"), ("b", "file")]).unwrap();
        let explicit = Settings::from_map([("b", "explicit")]).unwrap();
        let merged = file.merge(explicit).unwrap();
        assert_eq!(merged.get("a").as_deref(), Some("file"));
        assert_eq!(merged.get("b").as_deref(), Some("explicit"));
    }

    #[test]
    fn test_resolve_explicit_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"key_value": {{"instance": "from-file", "key": "id"}}}}"#).unwrap();

        let explicit = Settings::from_map([("key_value.instance", "explicit")]).unwrap();
        let settings =
            Settings::resolve(Some(file.path()), "POLYQUERY_TEST_UNSET", explicit).unwrap();
        assert_eq!(settings.get("key_value.instance").as_deref(), Some("explicit"));
        assert_eq!(settings.get("key_value.key").as_deref(), Some("id"));
    }

    #[test]
    fn test_enumerate_numeric_order() {
        let settings = Settings::from_map([
            ("host.10", "ten"),
            ("host.2", "two"),
            ("host.1", "one"),
            ("host.name", "skipped"),
            ("single", "only"),
        ])
        .unwrap();
        assert_eq!(settings.enumerate("host"), vec!["one", "two", "ten"]);
        assert_eq!(settings.enumerate("single"), vec!["only"]);
        assert!(settings.enumerate("absent").is_empty());
    }

    #[test]
    fn test_parse_typed() {
        let settings = Settings::from_map([("port", "9042"), ("flag", "maybe")]).unwrap();
        assert_eq!(settings.parse::<u16>("port").unwrap(), Some(9042));
        assert_eq!(settings.parse::<u16>("absent").unwrap(), None);

        let err = settings.parse::<bool>("flag").unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID_VALUE");
    }

    #[test]
    fn test_engine_config_defaults() {
        assert_eq!(EngineConfig::default().page_size, 100);
        assert_eq!(EngineConfig::from_settings(&Settings::new()).unwrap().page_size, 100);

        let settings = Settings::from_map([("engine.page_size", "25")]).unwrap();
        assert_eq!(EngineConfig::from_settings(&settings).unwrap().page_size, 25);

        let bad = Settings::from_map([("engine.page_size", "lots")]).unwrap();
        assert_eq!(EngineConfig::from_settings(&bad).unwrap_err().code(), "CONFIG_INVALID_VALUE");
    }
}
