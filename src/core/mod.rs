//! Core functionality for the tag reader bridge
//! This module contains the discovery/connection pipeline and the UID codec

pub mod bluetooth;
pub mod tag;

// Re-export commonly used types
pub use bluetooth::BluetoothManager;
pub use tag::decode_uid;
