use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::error::AppError;

pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:relay.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: &str = "5";
pub const DEFAULT_INGESTION_URL: &str = "http://127.0.0.1:5000/start-ingestion";

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Full URL of the external `start-ingestion` endpoint.
    pub ingestion_url: String,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            port: try_load("RUST_PORT", DEFAULT_PORT)?,
            database_url: try_load("DATABASE_URL", DEFAULT_DATABASE_URL)?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            ingestion_url: try_load("INGESTION_BACKEND_URL", DEFAULT_INGESTION_URL)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: 5,
            ingestion_url: DEFAULT_INGESTION_URL.to_string(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::Config(format!("{key}={raw}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let port: u16 = parse_value("RUST_PORT", DEFAULT_PORT).unwrap();
        let connections: u32 = parse_value("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS).unwrap();

        assert_eq!(port, Config::default().port);
        assert_eq!(connections, Config::default().database_max_connections);
    }

    #[test]
    fn test_trims_whitespace() {
        let port: u16 = parse_value("RUST_PORT", " 8080\n").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_invalid_value_is_config_error() {
        let result: Result<u16, _> = parse_value("RUST_PORT", "not-a-port");

        match result {
            Err(AppError::Config(message)) => assert!(message.starts_with("RUST_PORT=not-a-port")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_var_falls_back_to_default() {
        let url: String = try_load("RELAY_TEST_SURELY_UNSET_VARIABLE", DEFAULT_INGESTION_URL).unwrap();
        assert_eq!(url, DEFAULT_INGESTION_URL);
    }
}
