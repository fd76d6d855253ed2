//! Built-in completion chime.
//!
//! Two ascending sine notes generated by rodio, so no audio file has to ship
//! with the binary.

use std::time::Duration;

use rodio::source::{Amplify, SineWave, Source, TakeDuration};

/// A single note of the chime.
pub type ChimeNote = Amplify<TakeDuration<SineWave>>;

/// Two ascending notes (A5, E6) with their lengths in milliseconds.
const NOTES: [(f32, u64); 2] = [(880.0, 180), (1318.5, 320)];

/// Peak amplitude as a fraction of full scale.
const VOLUME: f32 = 0.4;

/// Builds the chime's notes in playback order.
///
/// Each note fades out over its length so it ends without a click.
#[must_use]
pub fn chime_notes() -> Vec<ChimeNote> {
    NOTES
        .iter()
        .map(|&(freq, millis)| {
            let mut note = SineWave::new(freq).take_duration(Duration::from_millis(millis));
            note.set_filter_fadeout();
            note.amplify(VOLUME)
        })
        .collect()
}
