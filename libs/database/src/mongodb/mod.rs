//! MongoDB connector and utilities

mod classify;
mod config;
mod connector;

pub use classify::{StoreFailure, classify};
pub use config::MongoConfig;
pub use connector::{connect_from_config, connect_from_config_with_retry, ping};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
