pub mod audio_config;
pub mod device_config;

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::audio_config::AudioConfig;
use crate::config::device_config::DeviceConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub audio: AudioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            device: DeviceConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads every per-concern config from the given directory.
    pub async fn load(config_dir: &Path) -> Result<Self> {
        Ok(AppConfig {
            device: DeviceConfig::load_config(config_dir).await?,
            audio: AudioConfig::load_config(config_dir).await?,
        })
    }
}
