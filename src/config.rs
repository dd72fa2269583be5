// Configuration management

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{AppConfig, CringeLevel};

/// Smallest accepted value for either timeout, in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

#[derive(Debug, Parser)]
#[command(name = "cringein", about = "Stream AI-generated parody LinkedIn posts in your terminal")]
pub struct Args {
    /// Base URL of the generation server
    #[arg(long)]
    pub server_url: Option<String>,

    /// Initial cringe level (1-10)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub cringe: Option<u8>,

    /// Read configuration from this file instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Command-line flags win over the config file for this run only
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.server_url {
            config.server_url.clone_from(url);
        }
        if let Some(level) = self.cringe {
            config.default_cringe_level = CringeLevel::new(level);
        }
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("cringein");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path()?)
}

/// Load `path`, writing the defaults there first if it does not exist yet.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_config = AppConfig::default();
        save_config_to(path, &default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(path).context("Failed to read config file")?;

    let mut config: AppConfig =
        toml::from_str(&contents).context("Failed to parse config file")?;
    clamp_timeouts(&mut config);

    Ok(config)
}

fn clamp_timeouts(config: &mut AppConfig) {
    if config.request_timeout < MIN_TIMEOUT_SECS {
        tracing::warn!(value = config.request_timeout, "request_timeout raised to the minimum");
        config.request_timeout = MIN_TIMEOUT_SECS;
    }
    if config.stream_idle_timeout < MIN_TIMEOUT_SECS {
        tracing::warn!(value = config.stream_idle_timeout, "stream_idle_timeout raised to the minimum");
        config.stream_idle_timeout = MIN_TIMEOUT_SECS;
    }
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, contents).context("Failed to write config file")?;

    Ok(())
}
