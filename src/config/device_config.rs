use crate::utils::ensure_directory_exists;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use log::{error, info, warn};

use crate::core::bluetooth::{DEFAULT_SCAN_WINDOW_SECS, READER_NAME};

const CONFIG_FILE_NAME: &str = "device_config.json";

/// Discovery behavior for this deployment. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// List every distinct device for the scan window, then stop.
    Browse,
    /// Scan until the first name match, then connect to it.
    AutoConnect,
}

/// Configuration for reader discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Substring of the advertised name that identifies the reader
    pub name_filter: String,
    /// Discovery behavior
    pub scan_mode: ScanMode,
    /// Length of the browse scan window in seconds
    pub scan_window_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            name_filter: READER_NAME.to_string(),
            scan_mode: ScanMode::AutoConnect,
            scan_window_secs: DEFAULT_SCAN_WINDOW_SECS,
        }
    }
}

impl DeviceConfig {
    /// Loads the config from a configuration file.
    /// A missing file writes the default back so there is one to edit.
    pub async fn load_config(config_dir: &Path) -> Result<Self> {
        let file_path = config_dir.join(CONFIG_FILE_NAME);
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !file_path.exists() {
            warn!("Device config file not found at {:?}, using default.", file_path_str);
            let config = Self::default();
            config.save_config(config_dir).await?;
            return Ok(config);
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Device config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the current config to a configuration file.
    pub async fn save_config(&self, config_dir: &Path) -> Result<()> {
        ensure_directory_exists(config_dir).await?;

        let file_path = config_dir.join(CONFIG_FILE_NAME);
        let file_path_str = file_path.to_string_lossy().into_owned();

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize device config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path.to_path_buf(), config_json).await?;
        info!("Device config saved to {:?}", file_path_str);
        Ok(())
    }
}
