//! Constants used throughout the application
//! This module contains all the constant values used in the application,
//! such as UUIDs, timeouts, and other configuration values.

use uuid::Uuid;

/// Name token advertised by the tag reader firmware
pub const READER_NAME: &str = "ESP32_RFID";

/// The UUID of the UART-style service the reader forwards tag UIDs on
/// (Nordic UART Service, as flashed on the ESP32)
pub const UUID_TAG_SERVICE: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);

/// The UUID of the characteristic carrying one tag UID per notification
pub const UUID_TAG_NOTIFY_CHAR: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// Bounded scan window for the browse policy, in seconds
pub const DEFAULT_SCAN_WINDOW_SECS: u64 = 10;
