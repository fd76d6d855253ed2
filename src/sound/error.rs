//! Sound error types.
//!
//! None of these reach the user: the notifier logs them at debug level and
//! carries on without audio.

use thiserror::Error;

/// Errors that can occur while playing the completion cue.
#[derive(Debug, Error)]
pub enum SoundError {
    /// No audio output device.
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// The configured cue file could not be opened.
    #[error("サウンドファイルが見つかりません: {0}")]
    FileNotFound(String),

    /// The cue could not be decoded.
    #[error("サウンドファイルのデコードに失敗しました: {0}")]
    DecodeError(String),

    /// The output stream rejected the sink.
    #[error("オーディオストリームの作成に失敗しました: {0}")]
    StreamError(String),

    #[error("サウンド再生エラー: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if the built-in chime should be tried instead.
    #[must_use]
    pub fn should_fallback_to_embedded(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }
}
