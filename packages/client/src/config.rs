//! Client configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scmbridge_provider_models::{Credentials, Provider};
use serde::Deserialize;

/// Errors that can occur when loading configuration or building a provider.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No config file in any of the searched locations.
    #[error("scmbridge config not found")]
    NotFound,

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field the selected provider cannot work without.
    #[error("Missing config field {field} for provider {provider}")]
    MissingField {
        field: &'static str,
        provider: Provider,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// On-disk shape: credentials are flat `token` or `username`/`password`.
#[derive(Debug, Deserialize)]
struct RawConfig {
    provider: Provider,
    base_url: Option<String>,
    organization: Option<String>,
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_seconds: Option<u64>,
}

/// Everything needed to construct one provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawConfig")]
pub struct ClientConfig {
    pub provider: Provider,
    /// Overrides the provider's public API root. Required for Bitbucket
    /// Server.
    pub base_url: Option<String>,
    /// Azure DevOps organization. Required for Azure Repos.
    pub organization: Option<String>,
    pub credentials: Credentials,
    /// Per-request timeout applied to the HTTP client.
    pub timeout: Option<Duration>,
    /// Path this config was loaded from.
    pub config_path: Option<PathBuf>,
}

impl From<RawConfig> for ClientConfig {
    fn from(raw: RawConfig) -> Self {
        let credentials = credentials_from(raw.token, raw.username, raw.password);
        Self {
            provider: raw.provider,
            base_url: raw.base_url.filter(|url| !url.trim().is_empty()),
            organization: raw.organization.filter(|org| !org.trim().is_empty()),
            credentials,
            timeout: raw.timeout_seconds.map(Duration::from_secs),
            config_path: None,
        }
    }
}

/// A token wins over username/password when both are present.
fn credentials_from(
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Credentials {
    match (token.filter(|t| !t.is_empty()), username, password) {
        (Some(token), _, _) => Credentials::Token { token },
        (None, Some(username), Some(password)) => Credentials::Basic { username, password },
        _ => Credentials::None,
    }
}

impl ClientConfig {
    #[must_use]
    pub const fn new(provider: Provider) -> Self {
        Self {
            provider,
            base_url: None,
            organization: None,
            credentials: Credentials::None,
            timeout: None,
            config_path: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Find and load the user's config.
    ///
    /// Searches in order:
    /// 1. `$XDG_CONFIG_HOME/scmbridge/config.json`
    /// 2. `~/.config/scmbridge/config.json`
    ///
    /// # Errors
    ///
    /// Returns an error if no config is found or parsing fails.
    pub fn load_default() -> Result<Self, ConfigError> {
        for path in Self::config_candidates().into_iter().flatten() {
            if path.exists() {
                log::debug!("Loading scmbridge config from: {}", path.display());
                return Self::load(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    fn config_candidates() -> Vec<Option<PathBuf>> {
        vec![
            dirs::config_dir().map(|p| p.join("scmbridge/config.json")),
            dirs::home_dir().map(|p| p.join(".config/scmbridge/config.json")),
        ]
    }

    /// Load config from a specific JSON file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the contents are not a valid config
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Reads `SCM_BASE_URL`, `SCM_ORGANIZATION`, `SCM_TOKEN`, `SCM_USERNAME`
    /// and `SCM_PASSWORD` from the process environment.
    #[must_use]
    pub fn from_env(provider: Provider) -> Self {
        Self::from_lookup(provider, |name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(provider: Provider, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            provider,
            base_url: non_empty("SCM_BASE_URL"),
            organization: non_empty("SCM_ORGANIZATION"),
            credentials: credentials_from(
                non_empty("SCM_TOKEN"),
                non_empty("SCM_USERNAME"),
                non_empty("SCM_PASSWORD"),
            ),
            timeout: None,
            config_path: None,
        }
    }
}
