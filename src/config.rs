use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::http::connection::ConnectionOptions;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8888";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub server_software: String,
    pub echo: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let options = ConnectionOptions::default();
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            server_software: options.server_software,
            echo: options.echo,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, overridden by the `LISTEN` environment variable.
    pub fn load() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Reads a YAML file, then applies the `LISTEN` environment variable.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg = Self::from_yaml(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg.with_env(|key| std::env::var(key).ok()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Applies environment overrides looked up through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("LISTEN") {
            self.listen_addr = addr;
        }
        self
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            server_software: self.server_software.clone(),
            echo: self.echo,
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
