//! Bluetooth manager for the tag reader bridge
//! This module provides the main interface for bluetooth operations

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use bluest::{Adapter, Device};
use log::info;
use tokio::sync::Mutex as AsyncMutex;

use crate::audio::ClipPlayerSender;
use crate::config::device_config::{DeviceConfig, ScanMode};
use crate::core::bluetooth::connection::ConnectionManager;
use crate::core::bluetooth::constants::{UUID_TAG_NOTIFY_CHAR, UUID_TAG_SERVICE};
use crate::core::bluetooth::notification::NotificationHandler;
use crate::core::bluetooth::scanner::{BluetoothScanner, ScanPolicy};
use crate::core::bluetooth::types::ConnectedDeviceState;
use crate::error::BridgeError;
use crate::events::EventSender;

/// Manages Bluetooth operations.
///
/// Owns the process-wide adapter handle; constructed once at startup and
/// torn down exactly once at shutdown, with the handle passed explicitly to
/// whatever drives the pipeline.
pub struct BluetoothManager {
    /// Map of device ids to devices
    devices: Arc<Mutex<HashMap<String, Device>>>,
    /// Currently connected device; at most one at a time
    connected_state: Arc<AsyncMutex<Option<ConnectedDeviceState>>>,
    /// Connection manager
    connection_manager: ConnectionManager,
    /// Bluetooth scanner
    scanner: BluetoothScanner,
    /// Notification handler
    notification_handler: NotificationHandler,
    /// Discovery policy for this deployment
    scan_policy: ScanPolicy,
}

impl BluetoothManager {
    /// Creates a new BluetoothManager
    pub async fn new(config: &DeviceConfig) -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");
        let devices = Arc::new(Mutex::new(HashMap::new()));

        let connection_manager = ConnectionManager::new(adapter.clone());
        let scanner = BluetoothScanner::new(adapter.clone(), devices.clone());

        let scan_policy = match config.scan_mode {
            ScanMode::Browse => ScanPolicy::Browse {
                window: Duration::from_secs(config.scan_window_secs),
            },
            ScanMode::AutoConnect => ScanPolicy::AutoConnect {
                name_token: config.name_filter.clone(),
            },
        };

        Ok(Self {
            devices,
            connected_state: Arc::new(AsyncMutex::new(None)),
            connection_manager,
            scanner,
            notification_handler: NotificationHandler::new(),
            scan_policy,
        })
    }

    /// Starts a scan pass under the configured policy
    pub async fn start_scan(&mut self, events: EventSender) -> Result<()> {
        self.scanner.start_scan(self.scan_policy.clone(), events).await
    }

    pub async fn stop_scan(&mut self) -> Result<()> {
        self.scanner.stop_scan().await
    }

    /// Connects to a discovered device and subscribes to tag notifications.
    ///
    /// A single attempt; on failure the manager stays idle and a later scan
    /// can try again. Any previously connected device is released first so
    /// only one link is ever open.
    pub async fn connect_device(
        &mut self,
        events: EventSender,
        device_id: &str,
        player: ClipPlayerSender,
    ) -> Result<()> {
        let device = {
            let devices = self.devices.lock().unwrap();
            devices
                .get(device_id)
                .cloned()
                .ok_or_else(|| anyhow!("Device not found with ID: {}", device_id))?
        };

        self.disconnect().await?;

        let notify_char = self
            .connection_manager
            .connect(&device, UUID_TAG_SERVICE, UUID_TAG_NOTIFY_CHAR)
            .await?;

        let state = ConnectedDeviceState {
            device,
            notify_characteristic: notify_char,
        };
        *self.connected_state.lock().await = Some(state);
        info!("Device successfully connected and state stored in the manager.");

        self.subscribe_notifications(events, player).await?;
        Ok(())
    }

    /// Opens the notification subscription on the connected reader.
    ///
    /// Discovery has already located the characteristic by the time a
    /// connection is stored, so calling this without one is a sequencing bug.
    pub async fn subscribe_notifications(
        &mut self,
        events: EventSender,
        player: ClipPlayerSender,
    ) -> Result<()> {
        let notify_char = {
            let guard = self.connected_state.lock().await;
            guard
                .as_ref()
                .map(|state| state.notify_characteristic.clone())
                .ok_or(BridgeError::NotReady(
                    "subscribe requested before connect and service discovery",
                ))?
        };

        self.notification_handler
            .setup_notifications(notify_char, player, events)
            .await?;
        Ok(())
    }

    /// Disconnects from the currently connected device, if any.
    /// Safe to call when nothing is connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.notification_handler.stop_notifications().await;

        let state = self.connected_state.lock().await.take();
        if let Some(state) = state {
            info!("Connected state cleared, releasing device and characteristic objects.");
            self.connection_manager.disconnect(&state.device).await?;
        }
        Ok(())
    }

    /// Releases every platform resource the manager holds: active scan,
    /// subscription, and connection. Idempotent; the process-exit path and
    /// the user-initiated path both land here.
    pub async fn teardown(&mut self) -> Result<()> {
        self.scanner.stop_scan().await?;
        self.disconnect().await?;
        Ok(())
    }

    /// Checks if a device is currently connected.
    pub async fn is_connected(&self) -> bool {
        let guard = self.connected_state.lock().await;
        if let Some(state) = guard.as_ref() {
            state.device.is_connected().await
        } else {
            false
        }
    }

    /// Returns the name of the currently connected device.
    pub async fn get_connected_device_name(&self) -> Option<String> {
        let guard = self.connected_state.lock().await;
        if let Some(state) = guard.as_ref() {
            let device = state.device.clone();
            drop(guard);
            device.name().ok()
        } else {
            None
        }
    }
}
