//! Defines shared data structures for the Bluetooth module.

use bluest::{Characteristic, Device};

/// Represents a discovered Bluetooth device
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiscoveredDevice {
    /// Platform-specific unique identifier for the device (especially important on macOS)
    pub id: String,
    /// The name of the device, if available
    pub name: Option<String>,
    /// The address of the device (MAC address on most platforms, may be absent on macOS)
    pub address: Option<String>,
    /// The signal strength (RSSI) of the device at discovery time
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    /// Creates a new DiscoveredDevice instance
    pub fn new(id: String, name: Option<String>, address: Option<String>, rssi: Option<i16>) -> Self {
        Self {
            id,
            name,
            address,
            rssi,
        }
    }
}

/// Represents the state of a successfully connected device.
/// This struct holds the active handles needed for interaction.
/// At most one of these exists at a time; connecting again replaces it.
#[derive(Clone)]
pub struct ConnectedDeviceState {
    /// The device handle, used for things like checking connection status or disconnecting.
    pub device: Device,
    /// The characteristic handle for receiving tag notifications from the reader.
    pub notify_characteristic: Characteristic,
}
