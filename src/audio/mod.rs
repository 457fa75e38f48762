//! Audio playback for the tag reader bridge
//! This module turns decoded tag UIDs into clip playback through rodio.

mod dispatcher;
mod player;

// Re-export types that should be publicly accessible
pub use dispatcher::ClipDispatcher;
pub use player::{ClipPlayerSender, PlaybackSink, RodioSink};
