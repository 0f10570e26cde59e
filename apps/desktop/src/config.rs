//! Startup configuration and on-disk locations.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::{local_store::SESSION_FILE, settings_store::SETTINGS_FILE};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "client.toml";
const APP_DIR_NAME: &str = "dumb-chat";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
    pub poll_interval_secs: u64,
    pub color: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: "info".to_string(),
            poll_interval_secs: 5,
            color: true,
        }
    }
}

impl StartupConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Reads `path` when it exists, then applies `APP__*` environment overrides.
pub fn load_startup_config(path: &Path) -> anyhow::Result<StartupConfig> {
    let config = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StartupConfig::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

pub fn apply_env_overrides(
    mut config: StartupConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> StartupConfig {
    if let Some(v) = lookup("APP__DATA_DIR") {
        config.data_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        config.log_filter = v;
    }
    if let Some(v) = lookup("APP__POLL_INTERVAL_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            config.poll_interval_secs = parsed;
        }
    }
    if lookup("NO_COLOR").is_some() {
        config.color = false;
    }
    config
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_root: PathBuf,
    pub settings_path: PathBuf,
    pub session_path: PathBuf,
}

impl AppPaths {
    pub fn from_startup(startup: &StartupConfig) -> anyhow::Result<Self> {
        let root = match &startup.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::config_dir()
                .ok_or_else(|| anyhow::anyhow!("unable to resolve the config directory"))?
                .join(APP_DIR_NAME),
        };

        Ok(Self {
            settings_path: root.join(SETTINGS_FILE),
            session_path: root.join(SESSION_FILE),
            data_root: root,
        })
    }
}
