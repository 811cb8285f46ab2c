use crate::collaborators::Settings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub save_directory: Option<String>,

    #[serde(default = "default_source_fps")]
    pub source_fps: u32,

    #[serde(default = "default_final_fps")]
    pub final_fps: u32,

    #[serde(default = "default_encoder")]
    pub encoder: String,

    #[serde(default = "default_display")]
    pub display: String,

    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

const FALLBACK_SAVE_DIR: &str = "timelapses";

fn default_source_fps() -> u32 {
    1
}

fn default_final_fps() -> u32 {
    60
}

fn default_encoder() -> String {
    "ffmpeg".to_string()
}

fn default_display() -> String {
    ":0.0".to_string()
}

fn default_stop_timeout() -> u64 {
    10
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_directory: None,
            source_fps: default_source_fps(),
            final_fps: default_final_fps(),
            encoder: default_encoder(),
            display: default_display(),
            stop_timeout_secs: default_stop_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/timelapse/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("timelapse").join("config.json"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source_fps == 0 {
            return Err(anyhow::anyhow!("source_fps must be greater than zero"));
        }

        if self.final_fps == 0 {
            return Err(anyhow::anyhow!("final_fps must be greater than zero"));
        }

        if self.encoder.trim().is_empty() {
            return Err(anyhow::anyhow!("encoder cannot be empty"));
        }

        if self.save_directory.as_deref().is_some_and(|dir| dir.trim().is_empty()) {
            return Err(anyhow::anyhow!(
                "save_directory cannot be empty, remove it to use the default"
            ));
        }

        Ok(())
    }
}

impl Settings for Config {
    fn save_directory(&self) -> PathBuf {
        let dir = self.save_directory.as_deref().unwrap_or(FALLBACK_SAVE_DIR);
        std::path::absolute(dir).unwrap_or_else(|_| PathBuf::from(dir))
    }

    fn source_fps(&self) -> u32 {
        self.source_fps
    }

    fn final_fps(&self) -> u32 {
        self.final_fps
    }
}
