//! # Application Configuration
//!
//! Settings for front ends: where the shop data file lives, how to reach the
//! assistant backend, and the log filter. Values come from an optional TOML
//! file and are overridden by environment variables:
//!
//! | Variable               | Field         |
//! |------------------------|---------------|
//! | `SHOPCALC_BACKEND_URL` | `backend_url` |
//! | `SHOPCALC_API_KEY`     | `api_key`     |
//! | `SHOPCALC_DATA_FILE`   | `data_file`   |
//! | `SHOPCALC_LOG`         | `log_filter`  |
//! | `SHOPCALC_USER`        | `user`        |
//!
//! ```toml
//! data_file = "/srv/shop/shop.json"
//! backend_url = "https://example.supabase.co"
//! log_filter = "calc_core=debug,info"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Config file used when `SHOPCALC_CONFIG` is not set
pub const DEFAULT_CONFIG_FILE: &str = "shopfloor.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub shop_name: String,
    /// Acting user for locks and permission checks
    pub user: String,
    pub data_file: PathBuf,
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    /// `tracing` filter directives
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            shop_name: "Shopfloor".to_string(),
            user: "admin".to_string(),
            data_file: PathBuf::from("shopfloor.json"),
            backend_url: None,
            api_key: None,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> CalcResult<Self> {
        toml::from_str(text).map_err(CalcError::serialization)
    }

    /// Read a TOML file; a missing file gives the defaults.
    pub fn from_file(path: &Path) -> CalcResult<Self> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read config", path.display().to_string(), e.to_string()))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty("SHOPCALC_BACKEND_URL") {
            self.backend_url = Some(url);
        }
        if let Some(key) = non_empty("SHOPCALC_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(file) = non_empty("SHOPCALC_DATA_FILE") {
            self.data_file = PathBuf::from(file);
        }
        if let Some(filter) = non_empty("SHOPCALC_LOG") {
            self.log_filter = filter;
        }
        if let Some(user) = non_empty("SHOPCALC_USER") {
            self.user = user;
        }
    }

    /// Load `SHOPCALC_CONFIG` (or `shopfloor.toml`) and apply the process
    /// environment.
    pub fn load() -> CalcResult<Self> {
        let path = std::env::var("SHOPCALC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Backend URL and key, both required for the assistant.
    pub fn backend(&self) -> CalcResult<(&str, &str)> {
        let url = self
            .backend_url
            .as_deref()
            .ok_or_else(|| CalcError::missing_field("backend_url"))?;
        let key = self.api_key.as_deref().ok_or_else(|| CalcError::missing_field("api_key"))?;
        Ok((url, key))
    }
}
