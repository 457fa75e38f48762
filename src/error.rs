//! Unified error type for the bridge pipeline.

use thiserror::Error;

/// Errors surfaced by the scan/connect/subscribe/playback pipeline.
///
/// None of these are retried automatically; each is reported at the boundary
/// where it is awaited and the pipeline returns to an idle, reconnectable
/// state.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The platform scan could not start or failed mid-stream.
    #[error("scan failed: {0}")]
    Scan(String),

    /// Connect attempt or GATT discovery failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An operation ran before the discovery step it depends on.
    #[error("not ready: {0}")]
    NotReady(&'static str),

    /// Characteristic subscribe failed; no subscription is active.
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// An audio source could not be opened or decoded.
    #[error("audio load failed: {0}")]
    Load(String),

    /// The audio output stream could not be opened or driven.
    #[error("audio playback failed: {0}")]
    Playback(String),
}
