//! Wide-column connection settings
//!
//! Keys under `wide_column.`:
//!
//! | key                          | meaning                                  |
//! |------------------------------|------------------------------------------|
//! | `host`, `host.N`             | contact points (default `localhost`)     |
//! | `port`                       | native protocol port (default 9042)      |
//! | `keyspace`                   | keyspace, required                       |
//! | `user`, `password`           | credentials                              |
//! | `name`                       | application name reported to the cluster |
//! | `data.center`                | local data center for load balancing     |
//! | `allow_filtering`            | append `ALLOW FILTERING` to selects      |
//! | `query`, `query.N`           | CQL run once when the session opens      |
//! | `strategy`                   | `stateful_cursor` (default) or `stateless` |
//! | `consistency`                | per-select consistency level             |

use crate::config::{ConfigError, Settings};
use crate::engine::ExecutionStrategy;

use super::compiler::WideColumnCompiler;
use super::statement::Consistency;

const PREFIX: &str = "wide_column";

/// Settings for one cluster connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideColumnSettings {
    pub hosts: Vec<String>,
    pub port: u16,
    pub keyspace: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub data_center: Option<String>,
    pub allow_filtering: bool,
    pub startup_queries: Vec<String>,
    pub strategy: ExecutionStrategy,
    pub consistency: Option<Consistency>,
}

fn key(name: &str) -> String {
    format!("{}.{}", PREFIX, name)
}

impl WideColumnSettings {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let mut hosts = settings.enumerate(&key("host"));
        if hosts.is_empty() {
            hosts.push("localhost".to_string());
        }
        let owned = |name: &str| settings.get(&key(name));

        let strategy = match owned("strategy") {
            None => ExecutionStrategy::StatefulCursor,
            Some(name) => ExecutionStrategy::parse(&name).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: key("strategy"),
                    reason: format!("unknown execution strategy {:?}", name),
                }
            })?,
        };
        let consistency = match owned("consistency") {
            None => None,
            Some(name) => Some(Consistency::parse(&name).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: key("consistency"),
                    reason: format!("unknown consistency level {:?}", name),
                }
            })?),
        };

        Ok(Self {
            hosts,
            port: settings.parse(&key("port"))?.unwrap_or(9042),
            keyspace: settings.require(&key("keyspace"))?,
            user: owned("user"),
            password: owned("password"),
            name: owned("name"),
            data_center: owned("data.center"),
            allow_filtering: settings.parse(&key("allow_filtering"))?.unwrap_or(false),
            startup_queries: settings.enumerate(&key("query")),
            strategy,
            consistency,
        })
    }

    /// `host:port` for every contact point; hosts that carry a port keep it
    pub fn contact_points(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| {
                if host.contains(':') {
                    host.clone()
                } else {
                    format!("{}:{}", host, self.port)
                }
            })
            .collect()
    }

    pub fn compiler(&self) -> WideColumnCompiler {
        WideColumnCompiler::new(self.keyspace.clone())
            .with_allow_filtering(self.allow_filtering)
            .with_strategy(self.strategy)
            .with_consistency(self.consistency)
    }
}
