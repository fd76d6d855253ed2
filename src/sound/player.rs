//! Completion cue playback through rodio.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::embedded::chime_notes;
use super::error::SoundError;
use super::source::SoundSource;

/// Plays cues on the default output device.
///
/// Playback is detached: `play` returns as soon as the cue is queued.
/// The output stream is not `Send`, so the player stays on the thread
/// that created it.
pub struct RodioSoundPlayer {
    /// Must outlive every sink created from `stream_handle`.
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl RodioSoundPlayer {
    /// Opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if there is no output device.
    pub fn new() -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }

    /// Plays `source`, falling back to the built-in chime when a custom
    /// file cannot be read or decoded.
    pub fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        match source {
            SoundSource::File { path, name } => match self.play_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.should_fallback_to_embedded() => {
                    warn!("Failed to play '{}': {}, using built-in chime", name, e);
                    self.play_embedded()
                }
                Err(e) => Err(e),
            },
            SoundSource::Embedded { name } => {
                debug!("Playing built-in cue: {}", name);
                self.play_embedded()
            }
        }
    }

    fn play_file(&self, path: &Path) -> Result<(), SoundError> {
        let file = File::open(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| SoundError::DecodeError(e.to_string()))?;

        let sink = self.new_sink()?;
        sink.append(decoder);
        sink.detach();

        debug!("Cue playback started");
        Ok(())
    }

    fn play_embedded(&self) -> Result<(), SoundError> {
        let sink = self.new_sink()?;
        for note in chime_notes() {
            sink.append(note);
        }
        sink.detach();

        debug!("Built-in chime started");
        Ok(())
    }

    fn new_sink(&self) -> Result<Sink, SoundError> {
        Sink::try_new(&self.stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer").finish_non_exhaustive()
    }
}

/// Opens the output device, or returns `None` when there is none.
///
/// A missing device is not an error for the timer: it just runs silently.
#[must_use]
pub fn try_create_player() -> Option<Arc<RodioSoundPlayer>> {
    match RodioSoundPlayer::new() {
        Ok(player) => Some(Arc::new(player)),
        Err(e) => {
            warn!("Audio not available, sound disabled: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests return early on machines without an output device.

    #[test]
    fn test_builtin_chime_plays() {
        let Ok(player) = RodioSoundPlayer::new() else {
            return;
        };

        assert!(player.play(&SoundSource::embedded("test")).is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_chime() {
        let Ok(player) = RodioSoundPlayer::new() else {
            return;
        };

        let source = SoundSource::file("/nonexistent/path/to/bell.wav");
        assert!(player.play(&source).is_ok());
    }

    #[test]
    fn test_try_create_player_does_not_panic() {
        let _ = try_create_player();
    }
}
