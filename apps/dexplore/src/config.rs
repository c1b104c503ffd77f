//! # Configuration
//!
//! Settings are resolved in three layers, later ones winning:
//! 1. Optional TOML file (`--config <path>`)
//! 2. Environment variables (`DEXPLORE_*`)
//! 3. CLI flags
//!
//! ## Environment Variables
//!
//! - `DEXPLORE_URL`: Base URL of the exploration service
//! - `DEXPLORE_API_KEY`: Bearer key (client side) / required key (server side)
//! - `DEXPLORE_RATE_LIMIT`: Requests per second, 0 disables
//! - `DEXPLORE_CORS_ORIGINS`: Comma-separated origins, or "*"
//! - `DEXPLORE_MAX_EXPLORATIONS`: Explorations the server holds at once
//! - `DEXPLORE_LOG_FORMAT`: `text` or `json`

use dexplore_core::DexploreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

pub const DEFAULT_MAX_EXPLORATIONS: usize = 1024;

// =============================================================================
// LOG FORMAT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = DexploreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(DexploreError::Validation(format!(
                "unknown log format '{other}' (expected text or json)"
            ))),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the exploration service used by `--remote` and `convert`.
    pub service_url: String,
    pub api_key: Option<String>,
    pub host: String,
    pub port: u16,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// `None` restricts CORS to localhost.
    pub cors_origins: Option<String>,
    /// Upper bound on explorations held by `serve`.
    pub max_explorations: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            api_key: None,
            host: "127.0.0.1".to_string(),
            port: 8000,
            rate_limit: 100,
            cors_origins: None,
            max_explorations: DEFAULT_MAX_EXPLORATIONS,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// File (if given) overlaid by the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, DexploreError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self, DexploreError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            DexploreError::Io(format!("Cannot read config '{}': {e}", path.display()))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(DexploreError::Validation(format!(
                "Config file exceeds {MAX_CONFIG_FILE_SIZE} bytes"
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            DexploreError::Io(format!("Cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DexploreError> {
        toml::from_str(content)
            .map_err(|e| DexploreError::Serialization(format!("Invalid config: {e}")))
    }

    /// Overlay `DEXPLORE_*` variables read through `lookup`.
    ///
    /// Empty values are ignored, as are values that fail to parse.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DEXPLORE_URL") {
            self.service_url = url;
        }
        if let Some(key) = get("DEXPLORE_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(limit) = get("DEXPLORE_RATE_LIMIT").and_then(|v| v.trim().parse().ok()) {
            self.rate_limit = limit;
        }
        if let Some(origins) = get("DEXPLORE_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        if let Some(max) = get("DEXPLORE_MAX_EXPLORATIONS").and_then(|v| v.trim().parse().ok()) {
            self.max_explorations = max;
        }
        if let Some(format) = get("DEXPLORE_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            self.log_format = format;
        }
        self
    }

    /// The configured API key, if non-empty.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

// =============================================================================
// TESTS
// =============================================================================
