//! Runtime configuration, read from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use facturas_core::FacturadorId;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("FACTURAS_BIND_ADDR is not a socket address: {0}")]
    InvalidBindAddr(String),

    #[error("FACTURAS_STORE must be `memory` or `postgres`, got `{0}`")]
    UnknownStore(String),

    #[error("DATABASE_URL must be set when FACTURAS_STORE=postgres")]
    MissingDatabaseUrl,

    #[error("FACTURAS_FACTURADORES contains an invalid biller id: {0}")]
    InvalidFacturador(String),
}

/// Which `FacturaStore` backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    /// Billers registered at startup.
    pub facturadores: Vec<FacturadorId>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("FACTURAS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let store = match lookup("FACTURAS_STORE")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("memory") => StoreBackend::Memory,
            Some("postgres") => {
                let database_url = lookup("DATABASE_URL")
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(ConfigError::MissingDatabaseUrl)?;
                StoreBackend::Postgres { database_url }
            }
            Some(other) => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        let facturadores = lookup("FACTURAS_FACTURADORES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<FacturadorId>()
                    .map_err(|_| ConfigError::InvalidFacturador(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bind_addr,
            store,
            facturadores,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.facturadores.is_empty());
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(
            config(&[("FACTURAS_STORE", "postgres")]).unwrap_err(),
            ConfigError::MissingDatabaseUrl
        );

        let cfg = config(&[
            ("FACTURAS_STORE", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/facturas"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/facturas".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_store_and_bad_address() {
        assert_eq!(
            config(&[("FACTURAS_STORE", "mongo")]).unwrap_err(),
            ConfigError::UnknownStore("mongo".to_string())
        );
        assert!(matches!(
            config(&[("FACTURAS_BIND_ADDR", "localhost")]).unwrap_err(),
            ConfigError::InvalidBindAddr(_)
        ));
    }

    #[test]
    fn parses_biller_list() {
        let cfg = config(&[("FACTURAS_FACTURADORES", "cli-1, cli-2,,")]).unwrap();
        let ids: Vec<&str> = cfg.facturadores.iter().map(|f| f.as_str()).collect();
        assert_eq!(ids, vec!["cli-1", "cli-2"]);
    }
}
