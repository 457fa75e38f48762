//! Maps decoded tag UIDs to clip playback.

use std::collections::HashMap;
use std::path::PathBuf;

use log::{error, info};

use crate::audio::player::PlaybackSink;

/// Turns each decoded tag UID into exactly one playback decision.
///
/// The clip table is injected at construction and read-only afterwards.
pub struct ClipDispatcher<S: PlaybackSink> {
    clips: HashMap<String, PathBuf>,
    sink: S,
}

impl<S: PlaybackSink> ClipDispatcher<S> {
    /// Create a new ClipDispatcher
    pub fn new(clips: HashMap<String, PathBuf>, sink: S) -> Self {
        Self { clips, sink }
    }

    /// Dispatches one tag UID.
    ///
    /// The active session is always released first, so two sessions never
    /// overlap and a burst of tags resolves to the last one. An unmapped UID
    /// is an expected miss, not an error.
    pub fn dispatch(&mut self, uid: &str) {
        self.sink.stop();

        let Some(path) = self.clips.get(uid) else {
            info!("No clip mapped for tag {}", uid);
            return;
        };

        info!("Playing clip {} for tag {}", path.display(), uid);
        if let Err(e) = self.sink.start(path) {
            error!("Failed to play clip for tag {}: {}", uid, e);
            self.sink.stop();
        }
    }

    /// Releases any active session. Safe to call repeatedly.
    pub fn release(&mut self) {
        self.sink.stop();
    }

    /// True while a clip is playing.
    pub fn is_playing(&self) -> bool {
        self.sink.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::error::BridgeError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SinkCall {
        Started(PathBuf),
        Stopped,
    }

    /// Records the call sequence instead of touching an audio device.
    #[derive(Default)]
    struct FakeSink {
        calls: Vec<SinkCall>,
        active: Option<PathBuf>,
        fail_next_start: bool,
    }

    impl PlaybackSink for FakeSink {
        fn start(&mut self, source: &Path) -> Result<(), BridgeError> {
            if self.fail_next_start {
                self.fail_next_start = false;
                return Err(BridgeError::Load("decode failed".to_string()));
            }
            self.calls.push(SinkCall::Started(source.to_path_buf()));
            self.active = Some(source.to_path_buf());
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.push(SinkCall::Stopped);
            self.active = None;
        }

        fn is_active(&self) -> bool {
            self.active.is_some()
        }
    }

    fn clips() -> HashMap<String, PathBuf> {
        HashMap::from([
            ("3062".to_string(), PathBuf::from("clips/first.mp3")),
            ("DEADBEEF".to_string(), PathBuf::from("clips/second.mp3")),
        ])
    }

    #[test]
    fn every_start_is_preceded_by_a_stop() {
        let mut dispatcher = ClipDispatcher::new(clips(), FakeSink::default());
        dispatcher.dispatch("3062");
        dispatcher.dispatch("DEADBEEF");
        dispatcher.dispatch("3062");

        let calls = &dispatcher.sink.calls;
        for (i, call) in calls.iter().enumerate() {
            if matches!(call, SinkCall::Started(_)) {
                assert_eq!(calls[i - 1], SinkCall::Stopped);
            }
        }
    }

    #[test]
    fn unmapped_uid_releases_and_plays_nothing() {
        let mut dispatcher = ClipDispatcher::new(clips(), FakeSink::default());
        dispatcher.dispatch("FFFF");
        assert!(!dispatcher.is_playing());
        assert_eq!(dispatcher.sink.calls, vec![SinkCall::Stopped]);
    }

    #[test]
    fn unmapped_uid_leaves_no_session_after_a_mapped_one() {
        let mut dispatcher = ClipDispatcher::new(clips(), FakeSink::default());
        dispatcher.dispatch("3062");
        assert!(dispatcher.is_playing());
        // The release-before-lookup discipline tears playback down even on a miss
        dispatcher.dispatch("FFFF");
        assert!(!dispatcher.is_playing());
    }

    #[test]
    fn back_to_back_tags_leave_only_the_second_clip_active() {
        let mut dispatcher = ClipDispatcher::new(clips(), FakeSink::default());
        dispatcher.dispatch("3062");
        dispatcher.dispatch("DEADBEEF");
        assert_eq!(
            dispatcher.sink.active,
            Some(PathBuf::from("clips/second.mp3"))
        );
    }

    #[test]
    fn load_failure_leaves_no_active_session() {
        let mut sink = FakeSink::default();
        sink.fail_next_start = true;
        let mut dispatcher = ClipDispatcher::new(clips(), sink);
        dispatcher.dispatch("3062");
        assert!(!dispatcher.is_playing());
        // The next dispatch proceeds normally
        dispatcher.dispatch("DEADBEEF");
        assert!(dispatcher.is_playing());
    }

    #[test]
    fn release_is_idempotent() {
        let mut dispatcher = ClipDispatcher::new(clips(), FakeSink::default());
        dispatcher.release();
        dispatcher.release();
        assert!(!dispatcher.is_playing());
    }
}
