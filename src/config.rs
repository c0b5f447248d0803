// src/config.rs
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const ENV_PREFIX: &str = "SHIFTBOARD_";

//=============================================================================
// Configuration
//=============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    // Persistence
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    // Server Configuration
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    // Logging
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Month shown when neither the store nor the import filename has one
    #[serde(default)]
    pub default_month: Option<u32>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("shiftboard_store.json")
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            server_host: default_server_host(),
            server_port: default_server_port(),
            log_level: default_log_level(),
            default_month: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        let config: Config = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validated()
    }

    /// Same as `from_env` but reads from the given pairs only.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX).from_iter(pairs)?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        match self.default_month {
            Some(month) if !(1..=12).contains(&month) => Err(AppError::InvalidMonth(month)),
            _ => Ok(self),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
