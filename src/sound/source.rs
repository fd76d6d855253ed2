//! Where the completion cue comes from.

use std::path::{Path, PathBuf};

/// Name of the built-in chime.
pub const BUILTIN_CUE: &str = "chime";

/// A sound the player can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// An audio file chosen by the user.
    File {
        /// Display name (file stem)
        name: String,
        /// Path to the file
        path: PathBuf,
    },
    /// The chime synthesized into the binary.
    Embedded {
        /// Display name
        name: String,
    },
}

impl SoundSource {
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::File { name, path }
    }

    #[must_use]
    pub fn embedded(name: impl Into<String>) -> Self {
        Self::Embedded { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Embedded { name } => name,
        }
    }

    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }
}

/// Picks the cue played when a period ends.
///
/// A configured file wins; otherwise the built-in chime is used.
#[must_use]
pub fn completion_cue(custom: Option<&Path>) -> SoundSource {
    match custom {
        Some(path) => SoundSource::file(path),
        None => SoundSource::embedded(BUILTIN_CUE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_uses_stem_as_name() {
        let source = SoundSource::file("/tmp/sounds/bell.wav");
        assert_eq!(source.name(), "bell");
        assert!(!source.is_embedded());
    }

    #[test]
    fn test_completion_cue_defaults_to_builtin() {
        let cue = completion_cue(None);
        assert!(cue.is_embedded());
        assert_eq!(cue.name(), BUILTIN_CUE);
    }

    #[test]
    fn test_completion_cue_prefers_custom_file() {
        let cue = completion_cue(Some(Path::new("/x/ding.ogg")));
        assert_eq!(
            cue,
            SoundSource::File {
                name: "ding".to_string(),
                path: PathBuf::from("/x/ding.ogg"),
            }
        );
    }
}
