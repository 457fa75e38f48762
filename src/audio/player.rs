//! Clip playback for scanned tags.
//! The rodio output stream is not `Send`, so playback runs on a dedicated
//! thread that owns the stream and receives dispatch requests over a channel.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::Result;
use log::{error, info, warn};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tokio::sync::mpsc;

use crate::audio::dispatcher::ClipDispatcher;
use crate::error::BridgeError;

/// Playback backend seam.
///
/// Holds at most one live audio resource; `start` releases the previous one
/// before acquiring the next, and `stop` is safe to call when idle.
pub trait PlaybackSink {
    /// Stop the current session, then open, decode, and start the source.
    fn start(&mut self, source: &Path) -> Result<(), BridgeError>;

    /// Release the current session, if any.
    fn stop(&mut self);

    /// True while a started source has not finished playing.
    fn is_active(&self) -> bool;
}

/// Plays clips through the default audio output via rodio.
pub struct RodioSink {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioSink {
    pub fn new() -> Result<Self, BridgeError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| BridgeError::Playback(e.to_string()))?;
        Ok(Self { stream, sink: None })
    }
}

impl PlaybackSink for RodioSink {
    fn start(&mut self, source: &Path) -> Result<(), BridgeError> {
        self.stop();

        let file = File::open(source)
            .map_err(|e| BridgeError::Load(format!("{}: {}", source.display(), e)))?;
        let decoded = Decoder::new(BufReader::new(file))
            .map_err(|e| BridgeError::Load(format!("{}: {}", source.display(), e)))?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(decoded);
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_active(&self) -> bool {
        self.sink.as_ref().map(|s| !s.empty()).unwrap_or(false)
    }
}

enum PlayerCommand {
    Dispatch(String),
    Shutdown,
}

/// A clonable handle that sends tag UIDs to the dedicated clip player thread.
#[derive(Clone)]
pub struct ClipPlayerSender {
    tx: mpsc::Sender<PlayerCommand>,
}

impl ClipPlayerSender {
    /// Spawns the player thread owning the output stream and the clip table.
    ///
    /// If no audio output is available the thread logs the failure once and
    /// drains dispatches, so the rest of the pipeline keeps running.
    pub fn new(clips: HashMap<String, PathBuf>) -> Self {
        let (tx, mut rx) = mpsc::channel(32);

        thread::spawn(move || {
            let sink = match RodioSink::new() {
                Ok(sink) => sink,
                Err(e) => {
                    error!("Audio output unavailable, clips will not play: {}", e);
                    while let Some(command) = rx.blocking_recv() {
                        if matches!(command, PlayerCommand::Shutdown) {
                            break;
                        }
                    }
                    return;
                }
            };

            let mut dispatcher = ClipDispatcher::new(clips, sink);
            info!("Clip player thread started.");

            while let Some(command) = rx.blocking_recv() {
                match command {
                    PlayerCommand::Dispatch(uid) => dispatcher.dispatch(&uid),
                    PlayerCommand::Shutdown => break,
                }
            }

            dispatcher.release();
            info!("Clip player thread stopped.");
        });

        Self { tx }
    }

    /// Queues one decoded tag UID for playback dispatch.
    /// Requests are played in the order they are sent.
    pub async fn dispatch(&self, uid: String) -> Result<()> {
        self.tx.send(PlayerCommand::Dispatch(uid)).await?;
        Ok(())
    }

    /// Stops the player thread and releases the audio output.
    pub async fn shutdown(&self) {
        if let Err(e) = self.tx.send(PlayerCommand::Shutdown).await {
            warn!("Clip player thread already stopped: {}", e);
        }
    }
}
