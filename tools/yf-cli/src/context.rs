//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use yf_auth::{AuthClient, FileSessionStore, Session};
use yf_commerce::api::HttpCommerceApi;
use yf_commerce::checkout::CheckoutSettings;
use yf_data::FetchClient;

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names searched for, nearest directory first.
const CONFIG_NAMES: [&str; 3] = ["yf.toml", ".yf.toml", "yf.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Path the config was loaded from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Storefront backend.
    pub api: HttpCommerceApi,
    /// Sign-in endpoints.
    pub auth: AuthClient,
    /// Saved session.
    pub sessions: FileSessionStore,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };
        let config = config.with_env_overrides();

        if let Some(ref path) = config_path {
            output.debug(&format!("Using config {}", path.display()));
        }

        let api = HttpCommerceApi::from_config(&config.storefront)
            .context("Failed to create storefront client")?;

        let api_config = &config.storefront.api;
        let fetch = FetchClient::with_policy(api_config.timeout, api_config.retry)
            .context("Failed to create auth client")?
            .with_base_url(api_config.base_url.clone());
        let auth = AuthClient::new(fetch);

        let sessions = FileSessionStore::new(config.session_path());
        tracing::debug!(
            base_url = %api_config.base_url,
            records_url = %api_config.records_url(),
            session = %sessions.path().display(),
            "cli context loaded"
        );

        Ok(Self {
            config,
            config_path,
            output,
            api,
            auth,
            sessions,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// The signed-in session, if any.
    pub fn current_session(&self) -> Result<Option<Session>> {
        self.sessions.load().with_context(|| {
            format!("Failed to read session file: {}", self.sessions.path().display())
        })
    }

    /// The signed-in session, or an error asking the user to sign in.
    pub fn session(&self) -> Result<Session> {
        self.current_session()?
            .ok_or_else(|| anyhow!("Not signed in. Run `yf auth login` first."))
    }

    /// Checkout settings from the loaded config.
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings::from(&self.config.storefront.checkout)
    }

    /// Where `yf config init` writes.
    pub fn default_config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_NAMES[0]))
    }
}
