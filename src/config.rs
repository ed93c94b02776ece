//! Runtime configuration.
//!
//! [`InventoryConfig`] is loaded from `config/inventory.toml` (optional) and
//! environment variables prefixed with `INVENTORY__` (e.g. `INVENTORY__DATA_DIR`).
//! It is passed explicitly to the components that need it.

use std::path::{Path, PathBuf};

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::framework::{StoreError, StoreLimits, StorePath};

pub const DEFAULT_CONFIG_FILE: &str = "config/inventory.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InventoryConfig {
    /// Directory that all catalog reads and writes are confined to.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Catalog file name, relative to `data_dir`.
    #[serde(default = "default_data_file")]
    pub data_file: String,
    /// Largest data file that will be loaded or written, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Longest accepted interactive input, in characters.
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    /// Threshold the menu starts with for low-stock reports.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_data_file() -> String {
    "inventory.json".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_max_input_length() -> usize {
    1000
}

fn default_low_stock_threshold() -> u32 {
    crate::catalog::DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            data_file: default_data_file(),
            max_file_size: default_max_file_size(),
            max_input_length: default_max_input_length(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

impl InventoryConfig {
    /// Load from [`DEFAULT_CONFIG_FILE`], falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from `file` (optional) layered under `INVENTORY__*` env vars.
    pub fn load_from(file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = file.as_ref();
        let env = || {
            Environment::with_prefix("INVENTORY")
                .prefix_separator("__")
                .separator("__")
        };

        let builder = Config::builder()
            .add_source(File::from(file).required(false))
            .add_source(env());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // A present but unreadable file is not fatal; retry with env only.
                if file.exists() {
                    warn!(error = %err, "Failed to load config file, falling back to env");
                }
                Config::builder().add_source(env()).build().map_err(|env_err| {
                    ConfigError::Message(format!(
                        "Failed to load configuration from file and env: {}, then env-only error: {}",
                        err, env_err
                    ))
                })?
            }
        };

        settings.try_deserialize::<InventoryConfig>().map_err(|e| {
            ConfigError::Message(format!("Inventory configuration is invalid: {}", e))
        })
    }

    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_file_size: self.max_file_size,
        }
    }

    /// The catalog file location, confined to `data_dir`.
    pub fn store_path(&self) -> Result<StorePath, StoreError> {
        StorePath::confined(&self.data_dir, &self.data_file)
    }
}
