use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use bluest::{Adapter, Device};
use futures_util::StreamExt;
use log::{debug, error, info};
use regex::Regex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;
use crate::events::{EventSender, PipelineEvent};
use crate::core::bluetooth::types::DiscoveredDevice;

/// Discovery policy for one scan pass.
///
/// Exactly one policy is active per manager instance; they never run
/// concurrently against the same device map.
#[derive(Debug, Clone)]
pub enum ScanPolicy {
    /// Accumulate every distinct device id for the length of the window,
    /// then stop. Matches the browsing variant of the reader app.
    Browse { window: Duration },
    /// Scan until an advertised name contains the token, then stop and
    /// hand the match off for connection. No time bound.
    AutoConnect { name_token: String },
}

/// Outcome of observing one discovery event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Duplicate id, non-matching name, or a match already happened.
    Ignored,
    /// New device under the browse policy; record it.
    Recorded,
    /// First name match under the auto-connect policy; stop scanning.
    Matched,
}

/// Tracks discoveries for one scan pass: de-duplication by device id and,
/// under the auto-connect policy, the first-match latch.
pub struct ScanLedger {
    policy: ScanPolicy,
    seen: std::collections::HashSet<String>,
    matched: bool,
}

impl ScanLedger {
    pub fn new(policy: ScanPolicy) -> Self {
        Self {
            policy,
            seen: std::collections::HashSet::new(),
            matched: false,
        }
    }

    /// Classifies one discovery event.
    ///
    /// Browse de-duplicates by id. Auto-connect instead tests the name on
    /// every event (a device may advertise its name only in a later scan
    /// response) and latches on the first match; everything after the match
    /// is ignored.
    pub fn observe(&mut self, id: &str, name: Option<&str>) -> Discovery {
        match &self.policy {
            ScanPolicy::Browse { .. } => {
                if self.seen.insert(id.to_string()) {
                    Discovery::Recorded
                } else {
                    Discovery::Ignored
                }
            }
            ScanPolicy::AutoConnect { name_token } => {
                if self.matched {
                    return Discovery::Ignored;
                }
                if name.map(|n| n.contains(name_token.as_str())).unwrap_or(false) {
                    self.matched = true;
                    Discovery::Matched
                } else {
                    Discovery::Ignored
                }
            }
        }
    }
}

pub struct BluetoothScanner {
    adapter: Adapter,
    devices: Arc<Mutex<HashMap<String, Device>>>,
    cancel_token: Arc<CancellationToken>,
    scan_task_handle: Option<JoinHandle<()>>,
}

impl BluetoothScanner {
    pub fn new(adapter: Adapter, devices: Arc<Mutex<HashMap<String, Device>>>) -> Self {
        Self {
            adapter,
            devices,
            cancel_token: Arc::new(CancellationToken::new()),
            scan_task_handle: None,
        }
    }

    /// Starts a scan pass under the given policy. Clears previously
    /// discovered records and returns immediately; progress is reported
    /// through pipeline events.
    pub async fn start_scan(&mut self, policy: ScanPolicy, events: EventSender) -> Result<()> {
        // Clear existing devices
        self.devices.lock().unwrap().clear();
        if self.scan_task_handle.is_some() {
            self.stop_scan().await?;
        }

        self.cancel_token = Arc::new(CancellationToken::new());
        let cancel_token_for_task = self.cancel_token.clone();

        let adapter_for_task = self.adapter.clone();
        let devices_for_task = self.devices.clone();
        let events_for_task = events.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = Self::internal_scan_task(
                adapter_for_task,
                devices_for_task,
                policy,
                events_for_task.clone(),
                cancel_token_for_task,
            )
            .await
            {
                error!("Scan task failed: {}", e);
            }
            // Always close the pass so the run loop can move on
            if let Err(e) = events_for_task.send(PipelineEvent::ScanComplete) {
                error!("Failed to send scan-complete event: {}", e);
            }
        });

        self.scan_task_handle = Some(handle);

        if let Err(e) = events.send(PipelineEvent::ScanStarted) {
            error!("Failed to send scan-start event: {}", e);
        }
        info!("Device scan task started.");
        Ok(())
    }

    /// Scans for Bluetooth devices using the bluest library
    async fn internal_scan_task(
        adapter: Adapter,
        devices: Arc<Mutex<HashMap<String, Device>>>,
        policy: ScanPolicy,
        events: EventSender,
        cancel_token: Arc<CancellationToken>,
    ) -> Result<(), BridgeError> {
        // An already-connected reader skips the radio scan entirely
        if let ScanPolicy::AutoConnect { name_token } = &policy {
            info!("Checking for connected devices");
            let connected_devices = adapter
                .connected_devices()
                .await
                .map_err(|e| BridgeError::Scan(e.to_string()))?;
            for device in connected_devices {
                if Self::is_tag_reader(&device, name_token) {
                    let record = Self::register_device(&devices, &events, device, None);
                    info!("Reader already connected: {}", record.id);
                    let _ = events.send(PipelineEvent::MatchFound { device_id: record.id });
                    return Ok(());
                }
            }
            info!("No connected reader detected");
        }

        let deadline = match &policy {
            ScanPolicy::Browse { window } => Some(tokio::time::Instant::now() + *window),
            ScanPolicy::AutoConnect { .. } => None,
        };
        let mut ledger = ScanLedger::new(policy);

        info!("Starting bluetooth scan");
        let mut scan_stream = adapter
            .scan(&[])
            .await
            .map_err(|e| BridgeError::Scan(e.to_string()))?;

        // Process discovered devices in real-time
        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            let device = discovered_device.device;
                            let rssi = discovered_device.rssi;

                            debug!("Found device - Device: {:?}, RSSI: {:?}", device, rssi);
                            let id = device.id().to_string();
                            let name = device.name().ok();
                            match ledger.observe(&id, name.as_deref()) {
                                Discovery::Ignored => {}
                                Discovery::Recorded => {
                                    Self::register_device(&devices, &events, device, rssi);
                                }
                                Discovery::Matched => {
                                    let record = Self::register_device(&devices, &events, device, rssi);
                                    info!("Reader name matched, stopping scan: {}", record.id);
                                    let _ = events.send(PipelineEvent::MatchFound { device_id: record.id });
                                    break;
                                }
                            }
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = async {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    info!("Scan window elapsed.");
                    break;
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn stop_scan(&mut self) -> Result<()> {
        info!("Stopping Bluetooth scan.");
        self.cancel_token.cancel();

        if let Some(handle) = self.scan_task_handle.take() {
            info!("Waiting for scan task to finish...");
            match handle.await {
                Ok(()) => info!("Scan task finished after cancellation."),
                Err(e) => {
                    if e.is_cancelled() {
                        info!("Scan task was cancelled successfully.");
                    } else {
                        error!("Scan task finished with an unexpected join error: {:?}", e);
                    }
                }
            }
        } else {
            info!("No active scan task handle found to wait for.");
        }

        Ok(())
    }

    /// Stores the device handle and reports a device-found event
    fn register_device(
        devices: &Arc<Mutex<HashMap<String, Device>>>,
        events: &EventSender,
        device: Device,
        rssi: Option<i16>,
    ) -> DiscoveredDevice {
        let id = device.id().to_string();
        let name = device.name().ok();
        let address = Self::extract_mac_address(&id);
        let record = DiscoveredDevice::new(id.clone(), name, address, rssi);
        info!(
            "Found device: ID: {}, Name: {:?}, Address: {:?}, RSSI: {:?}",
            record.id, record.name, record.address, record.rssi
        );

        {
            let mut devices = devices.lock().unwrap();
            devices.insert(id, device);
        }

        if let Err(e) = events.send(PipelineEvent::DeviceFound(record.clone())) {
            error!("Failed to send device-found event: {}", e);
        }
        record
    }

    fn extract_mac_address(device_id_str: &str) -> Option<String> {
        let re = Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").unwrap();
        re.find_iter(device_id_str)
            .last()
            .map(|m| m.as_str().to_string().to_uppercase())
    }

    /// Returns true if this device advertises the reader name token
    fn is_tag_reader(device: &Device, name_token: &str) -> bool {
        device
            .name()
            .ok()
            .as_ref()
            .map(|name| name.contains(name_token))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browse() -> ScanLedger {
        ScanLedger::new(ScanPolicy::Browse {
            window: Duration::from_secs(10),
        })
    }

    fn auto_connect() -> ScanLedger {
        ScanLedger::new(ScanPolicy::AutoConnect {
            name_token: "ESP32_RFID".to_string(),
        })
    }

    #[test]
    fn browse_records_each_distinct_id_once() {
        let mut ledger = browse();
        assert_eq!(ledger.observe("aa", Some("Thing")), Discovery::Recorded);
        assert_eq!(ledger.observe("bb", None), Discovery::Recorded);
        assert_eq!(ledger.observe("aa", Some("Thing")), Discovery::Ignored);
        assert_eq!(ledger.observe("aa", Some("Renamed")), Discovery::Ignored);
        assert_eq!(ledger.observe("cc", None), Discovery::Recorded);
    }

    #[test]
    fn auto_connect_ignores_non_matching_names() {
        let mut ledger = auto_connect();
        assert_eq!(ledger.observe("aa", Some("Headphones")), Discovery::Ignored);
        assert_eq!(ledger.observe("bb", None), Discovery::Ignored);
    }

    #[test]
    fn auto_connect_matches_once_then_ignores_everything() {
        let mut ledger = auto_connect();
        assert_eq!(ledger.observe("aa", Some("Lamp")), Discovery::Ignored);
        assert_eq!(
            ledger.observe("bb", Some("ESP32_RFID-01")),
            Discovery::Matched
        );
        // Further matches must not restart the connection attempt
        assert_eq!(
            ledger.observe("cc", Some("ESP32_RFID-02")),
            Discovery::Ignored
        );
        assert_eq!(ledger.observe("dd", Some("Lamp")), Discovery::Ignored);
    }

    #[test]
    fn auto_connect_matches_on_substring() {
        let mut ledger = auto_connect();
        assert_eq!(
            ledger.observe("aa", Some("ESP32_RFID-01")),
            Discovery::Matched
        );
    }

    #[test]
    fn auto_connect_retests_an_id_once_its_name_arrives() {
        let mut ledger = auto_connect();
        // First advertisement carries no name, the scan response does
        assert_eq!(ledger.observe("aa", None), Discovery::Ignored);
        assert_eq!(
            ledger.observe("aa", Some("ESP32_RFID-01")),
            Discovery::Matched
        );
    }
}
