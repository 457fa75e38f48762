//! Pipeline events emitted by the Bluetooth tasks.
//! The run loop consumes these and renders them as user-visible notices.

use tokio::sync::mpsc;

use crate::core::bluetooth::DiscoveredDevice;

/// Events delivered from the scan and notification tasks to the run loop.
#[derive(Debug, Clone, serde::Serialize)]
pub enum PipelineEvent {
    /// A scan pass has started listening for advertisements.
    ScanStarted,
    /// A device was seen for the first time in this scan pass.
    DeviceFound(DiscoveredDevice),
    /// The scan pass ended (match, window elapsed, cancel, or stream end).
    ScanComplete,
    /// The advertised name matched the configured reader token.
    MatchFound { device_id: String },
    /// The notification stream closed or could not be opened.
    /// The subscription is absent after this.
    SubscriptionEnded { reason: String },
}

/// Sender half handed to every task that reports pipeline events.
///
/// Unbounded so emitting from a select arm never blocks the scan stream.
pub type EventSender = mpsc::UnboundedSender<PipelineEvent>;

/// Receiver half owned by the run loop.
pub type EventReceiver = mpsc::UnboundedReceiver<PipelineEvent>;
