use crate::utils::ensure_directory_exists;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use log::{error, info, warn};

const CONFIG_FILE_NAME: &str = "audio_config.json";

/// Configuration for tag-to-clip mappings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Map from canonical tag UID (uppercase hex) to the clip played for it
    pub clips: HashMap<String, PathBuf>,
}

impl AudioConfig {
    /// Loads the config from a configuration file.
    /// A missing file writes the default back so there is one to edit.
    /// UID keys are normalized to uppercase; lookups are exact-match after that.
    pub async fn load_config(config_dir: &Path) -> Result<Self> {
        let file_path = config_dir.join(CONFIG_FILE_NAME);
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !file_path.exists() {
            warn!("Audio config file not found at {:?}, using default.", file_path_str);
            let config = Self::default();
            config.save_config(config_dir).await?;
            return Ok(config);
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;
        let config = config.normalized();

        if config.clips.is_empty() {
            warn!("No clips configured; every tag will be an expected miss.");
        }
        info!("Audio config loaded from {:?} ({} clips)", file_path_str, config.clips.len());
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
                error!("Failed to serialize audio config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path.to_path_buf(), config_json).await?;
        info!("Audio config saved to {:?}", file_path_str);
        Ok(())
    }

    /// Returns the config with UID keys uppercased to the canonical form.
    pub fn normalized(self) -> Self {
        Self {
            clips: self
                .clips
                .into_iter()
                .map(|(uid, path)| (uid.to_ascii_uppercase(), path))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized_to_uppercase() {
        let config = AudioConfig {
            clips: HashMap::from([
                ("3a6f".to_string(), PathBuf::from("clips/a.mp3")),
                ("DEAD".to_string(), PathBuf::from("clips/b.mp3")),
            ]),
        }
        .normalized();

        assert!(config.clips.contains_key("3A6F"));
        assert!(config.clips.contains_key("DEAD"));
        assert!(!config.clips.contains_key("3a6f"));
    }

    #[test]
    fn clip_table_round_trips_through_json() {
        let config = AudioConfig {
            clips: HashMap::from([("3062".to_string(), PathBuf::from("clips/chime.mp3"))]),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AudioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.clips.get("3062"), Some(&PathBuf::from("clips/chime.mp3")));
    }
}
