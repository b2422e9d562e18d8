//! Environment configuration for the API binary.

use std::net::SocketAddr;

use stockroom_observability::LogFormat;
use stockroom_reconcile::EngineConfig;

pub const BIND_ADDR_VAR: &str = "STOCKROOM_BIND_ADDR";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const REASSIGN_CONCURRENCY_VAR: &str = "STOCKROOM_REASSIGN_CONCURRENCY";
pub const LOG_FORMAT_VAR: &str = "STOCKROOM_LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; `None` selects the in-memory catalog.
    pub database_url: Option<String>,
    pub engine: EngineConfig,
    pub log_format: LogFormat,
    warnings: Vec<String>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Invalid values fall back to their defaults
    /// and are kept as [`ApiConfig::warnings`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut warnings = Vec::new();
        let default_addr = SocketAddr::from(([0, 0, 0, 0], 8080));

        let bind_addr = match lookup(BIND_ADDR_VAR) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warnings.push(format!(
                    "{BIND_ADDR_VAR}={raw:?} is not a socket address; using {DEFAULT_BIND_ADDR}"
                ));
                default_addr
            }),
            None => default_addr,
        };

        let database_url = lookup(DATABASE_URL_VAR).filter(|url| !url.trim().is_empty());

        let mut engine = EngineConfig::default();
        if let Some(raw) = lookup(REASSIGN_CONCURRENCY_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => engine = engine.with_reassign_concurrency(n),
                _ => warnings.push(format!(
                    "{REASSIGN_CONCURRENCY_VAR}={raw:?} is not a positive integer; using {}",
                    engine.reassign_concurrency()
                )),
            }
        }

        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warnings.push(format!("{LOG_FORMAT_VAR}: {e}; using json"));
                LogFormat::Json
            }),
            None => LogFormat::default(),
        };

        Self {
            bind_addr,
            database_url,
            engine,
            log_format,
            warnings,
        }
    }

    /// Problems found while reading the environment. Logged once tracing is up.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.engine, EngineConfig::default());
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.warnings().is_empty());
    }

    #[test]
    fn reads_all_variables() {
        let cfg = config(&[
            (BIND_ADDR_VAR, "127.0.0.1:9000"),
            (DATABASE_URL_VAR, "postgres://localhost/catalog"),
            (REASSIGN_CONCURRENCY_VAR, "3"),
            (LOG_FORMAT_VAR, "text"),
        ]);
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/catalog"));
        assert_eq!(cfg.engine.reassign_concurrency(), 3);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn invalid_values_fall_back_with_warnings() {
        let cfg = config(&[
            (BIND_ADDR_VAR, "nowhere"),
            (REASSIGN_CONCURRENCY_VAR, "0"),
            (LOG_FORMAT_VAR, "xml"),
            (DATABASE_URL_VAR, "  "),
        ]);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.engine.reassign_concurrency(), 8);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.warnings().len(), 3);
    }
}
