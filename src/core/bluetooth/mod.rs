//! Bluetooth functionality for the tag reader bridge
//! This module handles all bluetooth operations including scanning,
//! connecting, and receiving tag notifications from the reader.

mod connection;
mod constants;
mod manager;
mod notification;
mod scanner;
mod types;

// Re-export types that should be publicly accessible
pub use connection::ConnectionManager;
pub use constants::*; // Re-export all constants
pub use manager::BluetoothManager;
pub use notification::NotificationHandler;
pub use scanner::{BluetoothScanner, Discovery, ScanLedger, ScanPolicy};
pub use types::{ConnectedDeviceState, DiscoveredDevice};
