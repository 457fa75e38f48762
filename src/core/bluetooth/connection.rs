//! Bluetooth connection handling for the tag reader
//! This module handles connecting to and disconnecting from the reader

use bluest::{Adapter, Characteristic, Device, Uuid};
use log::info;

use crate::error::BridgeError;

/// Connection manager for the reader.
///
/// A connect attempt is made exactly once; a failure is reported to the
/// caller and the pipeline stays idle until the user scans again.
#[derive(Clone)]
pub struct ConnectionManager {
    adapter: Adapter,
}

impl ConnectionManager {
    pub fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Connect to the reader and locate the tag notification characteristic.
    ///
    /// Service discovery runs before this returns, so the handle is always
    /// valid to subscribe on.
    pub async fn connect(
        &self,
        device: &Device,
        tag_service_uuid: Uuid,
        notify_char_uuid: Uuid,
    ) -> Result<Characteristic, BridgeError> {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let id = device.id().to_string();
        info!("Device details - ID: {}, Name: {:?}", id, name);

        if !device.is_connected().await {
            info!("Initiating connection to {}...", id);
            self.adapter
                .connect_device(device)
                .await
                .map_err(|e| BridgeError::Connection(e.to_string()))?;
        }

        info!("Connection successful, discovering services...");
        let services = device
            .services()
            .await
            .map_err(|e| BridgeError::Connection(e.to_string()))?;
        let tag_service = services
            .iter()
            .find(|s| s.uuid() == tag_service_uuid)
            .ok_or_else(|| {
                for service in &services {
                    info!("Available service: {}", service.uuid());
                }
                BridgeError::Connection(format!("Tag service not found: {}", tag_service_uuid))
            })?
            .clone();

        info!("Found tag service: {}", tag_service.uuid());

        let characteristics = tag_service
            .characteristics()
            .await
            .map_err(|e| BridgeError::Connection(e.to_string()))?;
        let notify_char = characteristics
            .iter()
            .find(|c| c.uuid() == notify_char_uuid)
            .ok_or_else(|| {
                BridgeError::Connection(format!(
                    "Notification characteristic not found: {}",
                    notify_char_uuid
                ))
            })?
            .clone();

        info!("Found notification characteristic: {}", notify_char.uuid());
        Ok(notify_char)
    }

    /// Disconnect from the reader
    pub async fn disconnect(&self, device: &Device) -> Result<(), BridgeError> {
        if device.is_connected().await {
            info!("Disconnecting from device {}", device.id());
            self.adapter
                .disconnect_device(device)
                .await
                .map_err(|e| BridgeError::Connection(e.to_string()))?;
            info!("Successfully disconnected");
        } else {
            info!("Device {} not connected", device.id());
        }
        Ok(())
    }
}
