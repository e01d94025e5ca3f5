use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::info;

use ldp_fs_core::ClientConfig;

fn default_connect_timeout() -> u64 {
    5
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryConfig {
    pub base_uri: Option<String>,
    pub bearer_token: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_uri: None,
            bearer_token: None,
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Load `path` if given, otherwise the first candidate file that exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load_file(path);
        }
        for candidate in Self::candidate_paths() {
            if candidate.is_file() {
                return Self::load_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> anyhow::Result<Self> {
        info!(path = %path.display(), "Loading config");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let home = match std::env::var("HOME") {
            Ok(h) => PathBuf::from(h),
            Err(_) => return Vec::new(),
        };

        vec![home.join(".ldp-fs.toml")]
    }

    /// Merge command line overrides and build the HTTP client settings.
    pub fn client_config(
        &self,
        base_uri: Option<&str>,
        bearer_token: Option<&str>,
    ) -> anyhow::Result<ClientConfig> {
        let repository = &self.repository;
        let Some(base_uri) = base_uri.or(repository.base_uri.as_deref()) else {
            bail!("No repository base URI configured. Use --base-uri or [repository].base_uri");
        };

        let mut config = ClientConfig::new(base_uri);
        config.bearer_token = bearer_token
            .or(repository.bearer_token.as_deref())
            .map(str::to_string);
        config.connect_timeout = Duration::from_secs(repository.connect_timeout_secs);
        config.timeout = Duration::from_secs(repository.timeout_secs);
        Ok(config)
    }
}
