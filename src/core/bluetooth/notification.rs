//! Notification handling for the tag reader
//! This module handles setting up and processing tag notifications

use bluest::Characteristic;
use futures_util::StreamExt;
use log::{debug, error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::audio::ClipPlayerSender;
use crate::core::tag::decode_uid;
use crate::error::BridgeError;
use crate::events::{EventSender, PipelineEvent};

/// Notification handler for tag reads.
///
/// Owns the subscription task for the currently connected reader. Setting up
/// a new subscription cancels the previous task first, so at most one
/// listener exists per characteristic.
pub struct NotificationHandler {
    cancel_token: Option<CancellationToken>,
    task_handle: Option<JoinHandle<()>>,
}

impl NotificationHandler {
    /// Create a new NotificationHandler
    pub fn new() -> Self {
        Self {
            cancel_token: None,
            task_handle: None,
        }
    }

    /// Set up notifications for the reader.
    ///
    /// The subscribe call itself happens inside the spawned task (the notify
    /// stream borrows the characteristic); a subscribe failure is reported
    /// through a `SubscriptionEnded` event and the subscription is absent.
    pub async fn setup_notifications(
        &mut self,
        notify_char: Characteristic,
        player: ClipPlayerSender,
        events: EventSender,
    ) -> Result<(), BridgeError> {
        info!("Subscribing to notifications...");
        self.stop_notifications().await;

        let token = CancellationToken::new();
        let token_for_task = token.clone();

        let handle = tokio::spawn(async move {
            Self::process_notifications(notify_char, player, events, token_for_task).await;
        });

        self.cancel_token = Some(token);
        self.task_handle = Some(handle);
        Ok(())
    }

    /// Process notifications from the reader
    async fn process_notifications(
        notify_char: Characteristic,
        player: ClipPlayerSender,
        events: EventSender,
        cancel_token: CancellationToken,
    ) {
        info!("Listening for tag notifications...");

        match notify_char.notify().await {
            Ok(mut notification_stream) => loop {
                tokio::select! {
                    result = notification_stream.next() => {
                        match result {
                            Some(Ok(value)) => {
                                debug!("Received tag payload: {:?}", value);
                                let uid = decode_uid(&value);
                                debug!("Decoded tag UID: {}", uid);
                                if let Err(e) = player.dispatch(uid).await {
                                    error!("Failed to hand tag off to the clip player: {}", e);
                                }
                            }
                            Some(Err(e)) => {
                                error!("Error in notification stream: {}", e);
                                let _ = events.send(PipelineEvent::SubscriptionEnded {
                                    reason: e.to_string(),
                                });
                                break;
                            }
                            None => {
                                info!("Notification stream closed by the platform.");
                                let _ = events.send(PipelineEvent::SubscriptionEnded {
                                    reason: "stream closed".to_string(),
                                });
                                break;
                            }
                        }
                    }
                    _ = cancel_token.cancelled() => {
                        break;
                    }
                }
            },
            Err(e) => {
                let err = BridgeError::Subscription(e.to_string());
                error!("{}", err);
                let _ = events.send(PipelineEvent::SubscriptionEnded {
                    reason: err.to_string(),
                });
            }
        }

        info!("Notification stream ended");
    }

    /// Cancels the subscription task, if any. Safe to call repeatedly or
    /// when nothing is subscribed.
    pub async fn stop_notifications(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Notification task finished with a join error: {:?}", e);
                }
            }
        }
    }
}

impl Default for NotificationHandler {
    fn default() -> Self {
        Self::new()
    }
}
