//! CLI configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use yf_commerce::config::StorefrontConfig;

/// Environment variable overriding the REST API base URL.
pub const ENV_API_URL: &str = "YF_API_URL";
/// Environment variable overriding the record store base URL.
pub const ENV_RECORDS_URL: &str = "YF_RECORDS_URL";
/// Environment variable overriding the record store API key.
pub const ENV_RECORDS_KEY: &str = "YF_RECORDS_KEY";

/// CLI configuration file.
///
/// The storefront tables (`[api]`, `[checkout]`, `[catalog]`) sit at the top
/// level next to the CLI's own `[session]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Storefront configuration.
    #[serde(flatten)]
    pub storefront: StorefrontConfig,

    /// Where the signed-in session is kept.
    #[serde(default)]
    pub session: SessionConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Apply `YF_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let api = &mut self.storefront.api;

        if let Some(url) = var(ENV_API_URL) {
            api.base_url = url;
        }
        if let Some(url) = var(ENV_RECORDS_URL) {
            api.records_url = Some(url);
        }
        if let Some(key) = var(ENV_RECORDS_KEY) {
            api.records_key = Some(key);
        }
        self
    }

    /// Session file location.
    pub fn session_path(&self) -> PathBuf {
        self.session
            .path
            .clone()
            .unwrap_or_else(default_session_path)
    }
}

/// Session storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session file path (default: `<config dir>/yf/session.json`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yf")
        .join("session.json")
}

/// Generate a default yf.toml config file.
pub fn generate_default_config() -> String {
    r#"# YF storefront configuration

[api]
base_url = "http://localhost:8080"
# records_url = "https://records.example.com"
# records_key = "..."

# Milliseconds
[api.timeout]
connect = 3000
total = 10000

# Retries apply to idempotent requests only
[api.retry]
max_attempts = 2

[checkout]
free_delivery_threshold = 999
delivery_charge = 99
# "staged" or "atomic"
mode = "staged"
# false leaves a failed order on the server as "pending"
compensate_partial_failure = true

[catalog]
default_category = "General"

[session]
# path = "~/.config/yf/session.json"
"#
    .to_string()
}
