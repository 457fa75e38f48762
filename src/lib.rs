//! Tag reader bridge library
//! Scans for the BLE tag reader, connects to it, and plays the audio clip
//! mapped to each tag UID it reports.

// Module declarations
pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod utils;

use std::path::Path;

use anyhow::Result;
use log::{error, info};
use tokio::sync::mpsc;

use crate::audio::ClipPlayerSender;
use crate::config::AppConfig;
use crate::config::device_config::ScanMode;
use crate::core::BluetoothManager;
use crate::events::PipelineEvent;

/// Runs the bridge: config, audio worker, scan, then the event loop until
/// ctrl-c. Shutdown goes through the same teardown path in every case.
pub async fn run(config_dir: &Path) -> Result<()> {
    let config = AppConfig::load(config_dir).await?;
    let scan_mode = config.device.scan_mode;

    let player = ClipPlayerSender::new(config.audio.clips.clone());

    info!("Initializing BluetoothManager...");
    let mut manager = BluetoothManager::new(&config.device).await?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    manager.start_scan(events_tx.clone()).await?;

    loop {
        tokio::select! {
            maybe_event = events_rx.recv() => {
                match maybe_event {
                    Some(PipelineEvent::ScanStarted) => info!("Scanning..."),
                    Some(PipelineEvent::DeviceFound(device)) => {
                        info!(
                            "Discovered {} ({})",
                            device.name.as_deref().unwrap_or("Unknown"),
                            device.id
                        );
                    }
                    Some(PipelineEvent::MatchFound { device_id }) => {
                        match manager
                            .connect_device(events_tx.clone(), &device_id, player.clone())
                            .await
                        {
                            Ok(()) => {
                                if let Some(name) = manager.get_connected_device_name().await {
                                    info!("Connected to {}, waiting for tags.", name);
                                }
                            }
                            // Reported here; the pipeline stays idle and reconnectable
                            Err(e) => error!("Connection failed: {}", e),
                        }
                    }
                    Some(PipelineEvent::ScanComplete) => {
                        info!("Scan finished.");
                        if scan_mode == ScanMode::Browse {
                            // Browsing only lists devices for the window
                            break;
                        }
                    }
                    Some(PipelineEvent::SubscriptionEnded { reason }) => {
                        error!("Tag notifications ended: {}", reason);
                        if !manager.is_connected().await {
                            info!("Reader link lost; restart the bridge to reconnect.");
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down.");
                break;
            }
        }
    }

    manager.teardown().await?;
    player.shutdown().await;
    Ok(())
}
