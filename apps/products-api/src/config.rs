//! Configuration for Products API

use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse, server::ServerConfig};
use database::mongodb::MongoConfig;
use std::time::Duration;
use strum::{Display, EnumString};

pub use core_config::Environment;

/// Where product documents live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    #[default]
    Mongodb,
    Memory,
}

impl FromEnv for StoreBackend {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env_or_default("PRODUCTS_STORE", "mongodb");
        raw.trim().parse().map_err(|_| ConfigError::ParseError {
            key: "PRODUCTS_STORE".to_string(),
            details: format!("unknown store '{raw}', expected 'mongodb' or 'memory'"),
        })
    }
}

/// Query execution settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryConfig {
    /// Deadline applied to every store call.
    pub timeout: Duration,
}

impl FromEnv for QueryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let millis: u64 = env_parse("QUERY_TIMEOUT_MS", "5000")?;
        if millis == 0 {
            return Err(ConfigError::ParseError {
                key: "QUERY_TIMEOUT_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            timeout: Duration::from_millis(millis),
        })
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreBackend,
    /// Present only when `store` is [`StoreBackend::Mongodb`].
    pub mongodb: Option<MongoConfig>,
    pub query: QueryConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let store = StoreBackend::from_env()?;
        let query = QueryConfig::from_env()?;

        let mongodb = match store {
            StoreBackend::Mongodb => Some(MongoConfig::from_env()?),
            StoreBackend::Memory => None,
        };

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            store,
            mongodb,
            query,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONGO_VARS: [(&str, Option<&str>); 2] = [
        ("MONGODB_URL", Some("mongodb://localhost:27017")),
        ("MONGODB_DATABASE", Some("shop")),
    ];

    #[test]
    fn test_defaults_to_mongodb_store() {
        temp_env::with_vars(
            [
                ("PRODUCTS_STORE", None),
                ("QUERY_TIMEOUT_MS", None),
                MONGO_VARS[0],
                MONGO_VARS[1],
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.store, StoreBackend::Mongodb);
                assert_eq!(config.query.timeout, Duration::from_millis(5000));
                let mongodb = config.mongodb.unwrap();
                assert_eq!(mongodb.database(), "shop");
            },
        );
    }

    #[test]
    fn test_mongodb_store_requires_url() {
        temp_env::with_vars(
            [
                ("PRODUCTS_STORE", Some("mongodb")),
                ("MONGODB_URL", None),
                ("MONGO_URL", None),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("MONGODB_URL"));
            },
        );
    }

    #[test]
    fn test_memory_store_needs_no_mongo_settings() {
        temp_env::with_vars(
            [
                ("PRODUCTS_STORE", Some("Memory")),
                ("MONGODB_URL", None),
                ("MONGO_URL", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.store, StoreBackend::Memory);
                assert!(config.mongodb.is_none());
            },
        );
    }

    #[test]
    fn test_unknown_store_is_rejected() {
        temp_env::with_var("PRODUCTS_STORE", Some("postgres"), || {
            let err = StoreBackend::from_env().unwrap_err();
            assert!(err.to_string().contains("PRODUCTS_STORE"));
        });
    }

    #[test]
    fn test_query_timeout_from_env() {
        temp_env::with_var("QUERY_TIMEOUT_MS", Some("250"), || {
            let query = QueryConfig::from_env().unwrap();
            assert_eq!(query.timeout, Duration::from_millis(250));
        });
    }

    #[test]
    fn test_query_timeout_rejects_garbage_and_zero() {
        temp_env::with_var("QUERY_TIMEOUT_MS", Some("soon"), || {
            let err = QueryConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("QUERY_TIMEOUT_MS"));
        });
        temp_env::with_var("QUERY_TIMEOUT_MS", Some("0"), || {
            assert!(QueryConfig::from_env().is_err());
        });
    }
}
