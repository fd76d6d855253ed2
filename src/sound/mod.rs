//! Audio cue for completed periods.
//!
//! ```text
//! ┌──────────────────┐
//! │     Notifier     │
//! └────────┬─────────┘
//!          │ play(&SoundSource)
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │   SoundPlayer    │────▶│ configured file  │
//! │ (rodio or mock)  │     ├──────────────────┤
//! │                  │────▶│ built-in chime   │
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! A machine without an audio device gets no player at all; the timer keeps
//! working silently.

mod embedded;
mod error;
mod player;
mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub use embedded::{chime_notes, ChimeNote};
pub use error::SoundError;
pub use player::{try_create_player, RodioSoundPlayer};
pub use source::{completion_cue, SoundSource, BUILTIN_CUE};

/// Something that can play a cue.
pub trait SoundPlayer {
    /// Queues `source` for playback and returns immediately.
    fn play(&self, source: &SoundSource) -> Result<(), SoundError>;
}

impl SoundPlayer for RodioSoundPlayer {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        RodioSoundPlayer::play(self, source)
    }
}

/// Records play calls instead of producing sound.
#[derive(Debug, Default)]
pub struct MockSoundPlayer {
    play_calls: Mutex<Vec<SoundSource>>,
    should_fail: AtomicBool,
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.play_calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<SoundSource> {
        self.play_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        if let Ok(mut calls) = self.play_calls.lock() {
            calls.push(source.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_plays() {
        let mock = MockSoundPlayer::new();
        mock.play(&completion_cue(None)).unwrap();

        assert_eq!(mock.play_count(), 1);
        assert_eq!(mock.get_play_calls()[0].name(), BUILTIN_CUE);
    }

    #[test]
    fn test_mock_failure_records_nothing() {
        let mock = MockSoundPlayer::new();
        mock.set_should_fail(true);
        let _ = mock.play(&completion_cue(None));

        mock.set_should_fail(false);
        mock.play(&completion_cue(Some(std::path::Path::new("/tmp/bell.wav")))).unwrap();
        assert_eq!(mock.play_count(), 1);
        assert_eq!(mock.get_play_calls()[0].name(), "bell");
    }

    #[test]
    fn test_mock_failure() {
        let mock = MockSoundPlayer::new();
        mock.set_should_fail(true);
        assert!(mock.play(&completion_cue(None)).is_err());
    }
}
