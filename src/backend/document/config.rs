//! Document store settings
//!
//! Keys under `document.`: `host` / `host.N` (default `localhost:9200`) and
//! the required `index`.

use crate::config::{ConfigError, Settings};

use super::compiler::DocumentCompiler;

/// Settings for one search cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSettings {
    pub hosts: Vec<String>,
    pub index: String,
}

impl DocumentSettings {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let mut hosts = settings.enumerate("document.host");
        if hosts.is_empty() {
            hosts.push("localhost:9200".to_string());
        }
        Ok(Self {
            hosts,
            index: settings.require("document.index")?,
        })
    }

    pub fn compiler(&self) -> DocumentCompiler {
        DocumentCompiler::new(self.index.clone())
    }
}
