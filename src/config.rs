//! Top-level application configuration.
//!
//! Configuration is stored in `.inventory/config.yaml` (or the file named by
//! `INVENTORY_CONFIG`) and includes:
//! - The backend base URL, bearer token and request timeout
//! - List defaults: page size, debounce window and sort

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};
use crate::query::{QueryState, parse_sort};

pub const CONFIG_DIR: &str = ".inventory";
pub const CONFIG_PATH_ENV: &str = "INVENTORY_CONFIG";
pub const API_URL_ENV: &str = "INVENTORY_API_URL";
pub const API_TOKEN_ENV: &str = "INVENTORY_API_TOKEN";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Keys accepted by `config get` / `config set`.
pub const CONFIG_KEYS: &[&str] = &[
    "api.base_url",
    "api.token",
    "api.timeout_secs",
    "list.page_size",
    "list.debounce_ms",
    "list.sort",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub list: ListConfig,
}

/// Backend connection settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Whole-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// List presentation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiet period after the last edit before a fetch fires
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Initial sort, as `field,direction`
    #[serde(default = "default_sort")]
    pub sort: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            sort: default_sort(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    crate::query::DEFAULT_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_sort() -> String {
    "name,asc".to_string()
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        PathBuf::from(CONFIG_DIR).join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            InventoryError::Config(format!("invalid api.base_url '{}': {e}", self.api.base_url))
        })?;
        if self.list.page_size == 0 {
            return Err(InventoryError::Config(
                "list.page_size must be at least 1".to_string(),
            ));
        }
        parse_sort(&self.list.sort)
            .map_err(|e| InventoryError::Config(format!("invalid list.sort: {e}")))?;
        Ok(())
    }

    /// Base URL from environment variable or config file
    pub fn base_url(&self) -> String {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return url;
        }
        self.api.base_url.clone()
    }

    /// API token from environment variable or config file
    pub fn api_token(&self) -> Option<String> {
        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }
        self.api.token.clone()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.list.debounce_ms)
    }

    /// Initial query built from the list defaults
    pub fn initial_query(&self) -> Result<QueryState> {
        let (field, order) = parse_sort(&self.list.sort)?;
        Ok(QueryState::new()
            .with_page_size(self.list.page_size)
            .with_sort(field, order))
    }

    /// Read a single value by dotted key; secrets come back unmasked.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "api.base_url" => Some(self.api.base_url.clone()),
            "api.token" => self.api.token.clone(),
            "api.timeout_secs" => Some(self.api.timeout_secs.to_string()),
            "list.page_size" => Some(self.list.page_size.to_string()),
            "list.debounce_ms" => Some(self.list.debounce_ms.to_string()),
            "list.sort" => Some(self.list.sort.clone()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a single value by dotted key, validating it first.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => {
                url::Url::parse(value).map_err(|e| {
                    InventoryError::Config(format!("invalid URL '{value}': {e}"))
                })?;
                self.api.base_url = value.to_string();
            }
            "api.token" => {
                self.api.token = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "api.timeout_secs" => self.api.timeout_secs = parse_number(key, value)?,
            "list.page_size" => {
                let size: u32 = parse_number(key, value)?;
                if size == 0 {
                    return Err(InventoryError::Config(
                        "list.page_size must be at least 1".to_string(),
                    ));
                }
                self.list.page_size = size;
            }
            "list.debounce_ms" => self.list.debounce_ms = parse_number(key, value)?,
            "list.sort" => {
                parse_sort(value)?;
                self.list.sort = value.to_string();
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> InventoryError {
    InventoryError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| InventoryError::Config(format!("{key} expects a number, got '{value}'")))
}
