//! Service configuration from environment key/values.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use cartaporte_infra::SchemaRevision;
use cartaporte_render::FontSource;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// `None` runs against the in-memory sample store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub schema_revision: SchemaRevision,
    pub font: FontSource,
    pub audit_log_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct StartupError {
    pub code: &'static str,
    pub message: String,
}

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_FONT_NAME: &str = "Arial";
pub const DEFAULT_FONT_PATH: &str = "./arial.ttf";
pub const DEFAULT_AUDIT_LOG: &str = "logs.json";

impl ApiConfig {
    pub fn load() -> Result<Self, StartupError> {
        let kv: HashMap<String, String> = std::env::vars().collect();
        Self::from_kv(&kv)
    }

    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, StartupError> {
        let bind_addr = parse_socket_addr(
            kv.get("CRT_BIND_ADDR"),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            "CRT_BIND_ADDR",
        )?;

        let database_url = optional_nonempty(kv, "DATABASE_URL");

        let db_max_connections = parse_u32(
            kv.get("CRT_DB_MAX_CONNECTIONS"),
            DEFAULT_DB_MAX_CONNECTIONS,
            "CRT_DB_MAX_CONNECTIONS",
        )?;
        if db_max_connections == 0 {
            return Err(StartupError {
                code: "ERR_INVALID_CONFIG",
                message: "CRT_DB_MAX_CONNECTIONS must be at least 1".to_string(),
            });
        }

        let db_acquire_timeout = Duration::from_secs(parse_u64(
            kv.get("CRT_DB_ACQUIRE_TIMEOUT_SECS"),
            DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            "CRT_DB_ACQUIRE_TIMEOUT_SECS",
        )?);

        let schema_revision = match optional_nonempty(kv, "CRT_SCHEMA_REVISION") {
            None => SchemaRevision::Normalized,
            Some(v) => v.parse::<SchemaRevision>().map_err(|message| StartupError {
                code: "ERR_INVALID_SCHEMA_REVISION",
                message,
            })?,
        };

        let font = FontSource::new(
            optional_nonempty(kv, "CRT_FONT_NAME").unwrap_or_else(|| DEFAULT_FONT_NAME.to_string()),
            optional_nonempty(kv, "CRT_FONT_PATH").unwrap_or_else(|| DEFAULT_FONT_PATH.to_string()),
        );

        let audit_log_path = PathBuf::from(
            optional_nonempty(kv, "CRT_AUDIT_LOG").unwrap_or_else(|| DEFAULT_AUDIT_LOG.to_string()),
        );

        Ok(Self {
            bind_addr,
            database_url,
            db_max_connections,
            db_acquire_timeout,
            schema_revision,
            font,
            audit_log_path,
        })
    }
}

fn optional_nonempty(kv: &HashMap<String, String>, key: &str) -> Option<String> {
    kv.get(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn parse_socket_addr(
    value: Option<&String>,
    default: SocketAddr,
    key: &'static str,
) -> Result<SocketAddr, StartupError> {
    match value {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse::<SocketAddr>().map_err(|_| StartupError {
            code: "ERR_INVALID_CONFIG",
            message: format!("{} must be a valid host:port socket address", key),
        }),
    }
}

fn parse_u64(value: Option<&String>, default: u64, key: &'static str) -> Result<u64, StartupError> {
    match value {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse::<u64>().map_err(|_| StartupError {
            code: "ERR_INVALID_CONFIG",
            message: format!("{} must be an integer", key),
        }),
    }
}

fn parse_u32(value: Option<&String>, default: u32, key: &'static str) -> Result<u32, StartupError> {
    match value {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse::<u32>().map_err(|_| StartupError {
            code: "ERR_INVALID_CONFIG",
            message: format!("{} must be an integer", key),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_to_an_empty_environment() {
        let cfg = ApiConfig::from_kv(&HashMap::new()).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.db_max_connections, 5);
        assert_eq!(cfg.db_acquire_timeout, Duration::from_secs(5));
        assert_eq!(cfg.schema_revision, SchemaRevision::Normalized);
        assert_eq!(cfg.font, FontSource::new("Arial", "./arial.ttf"));
        assert_eq!(cfg.audit_log_path, PathBuf::from("logs.json"));
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let cfg = ApiConfig::from_kv(&kv(&[
            ("CRT_BIND_ADDR", "127.0.0.1:3002"),
            ("DATABASE_URL", "postgres://crt@localhost/crt"),
            ("CRT_DB_MAX_CONNECTIONS", "12"),
            ("CRT_SCHEMA_REVISION", "legacy"),
            ("CRT_FONT_PATH", "/fonts/arial.ttf"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 3002);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://crt@localhost/crt"));
        assert_eq!(cfg.db_max_connections, 12);
        assert_eq!(cfg.schema_revision, SchemaRevision::Legacy);
        assert_eq!(cfg.font.path, PathBuf::from("/fonts/arial.ttf"));
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let cfg = ApiConfig::from_kv(&kv(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(cfg.database_url, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ApiConfig::from_kv(&kv(&[("CRT_SCHEMA_REVISION", "v3")])).unwrap_err();
        assert_eq!(err.code, "ERR_INVALID_SCHEMA_REVISION");

        let err = ApiConfig::from_kv(&kv(&[("CRT_BIND_ADDR", "nope")])).unwrap_err();
        assert_eq!(err.code, "ERR_INVALID_CONFIG");

        let err = ApiConfig::from_kv(&kv(&[("CRT_DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert_eq!(err.code, "ERR_INVALID_CONFIG");
    }

    #[test]
    fn startup_error_displays_code_and_message() {
        let err = ApiConfig::from_kv(&kv(&[("CRT_SCHEMA_REVISION", "v3")])).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("ERR_INVALID_SCHEMA_REVISION: "), "{text}");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }
}
