//! Process configuration, read from the environment.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `USE_PERSISTENT_STORES` | `false` | use Postgres instead of the in-memory catalog |
//! | `DATABASE_URL` | (required when persistent) | Postgres connection string |
//! | `DATABASE_MAX_CONNECTIONS` | `5` | pool size |
//! | `RECONCILE_PAGE_SIZE` | `100` | storages loaded per page during reconciliation |
//!
//! Binaries call `dotenvy::dotenv()` first, so a `.env` file works too.

use std::net::SocketAddr;

use thiserror::Error;

use stockroom_infra::reconcile::DEFAULT_PAGE_SIZE;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Which catalog backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    pub reconcile_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let use_persistent = match get("USE_PERSISTENT_STORES") {
            Some(v) => v.trim().parse::<bool>().map_err(|e| ConfigError::Invalid {
                name: "USE_PERSISTENT_STORES",
                reason: e.to_string(),
            })?,
            None => false,
        };

        let store = if use_persistent {
            let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = parse_positive(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS as usize);
            StoreConfig::Postgres {
                database_url: validate_database_url(database_url)?,
                max_connections: u32::try_from(max_connections).map_err(|e| ConfigError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    reason: e.to_string(),
                })?,
            }
        } else {
            StoreConfig::InMemory
        };

        let reconcile_page_size =
            parse_positive(get("RECONCILE_PAGE_SIZE"), "RECONCILE_PAGE_SIZE")?.unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self {
            bind_addr,
            store,
            reconcile_page_size,
        })
    }
}

fn parse_positive(value: Option<String>, name: &'static str) -> Result<Option<usize>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be at least 1".to_string(),
        }),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

fn validate_database_url(url: String) -> Result<String, ConfigError> {
    let lower = url.to_lowercase();
    if !(lower.starts_with("postgres://") || lower.starts_with("postgresql://")) {
        return Err(ConfigError::Invalid {
            name: "DATABASE_URL",
            reason: "must start with postgres:// or postgresql://".to_string(),
        });
    }
    Ok(url)
}
