//! Sound system error types.
//!
//! Every error here is absorbed by the timer engine: a failing sound never
//! stops a phase from running, it only makes it silent.

use thiserror::Error;

/// Errors that can occur in the sound playback system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Sound file was not found at the specified path.
    #[error("sound file not found: {0}")]
    FileNotFound(String),

    /// Failed to decode the audio file.
    #[error("failed to decode sound file: {0}")]
    DecodeError(String),

    /// Failed to create the audio output stream.
    #[error("failed to create audio stream: {0}")]
    StreamError(String),

    /// The requested noise key is not in the noise library.
    #[error("unknown noise: {0}")]
    UnknownNoise(String),

    /// Generic sound playback error.
    #[error("sound playback error: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to the audio file or its key.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::DecodeError(_) | Self::UnknownNoise(_)
        )
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "connect an audio output device",
            Self::FileNotFound(_) | Self::UnknownNoise(_) => {
                "check the files in the assets/sounds directory"
            }
            Self::DecodeError(_) => "the sound file may be corrupted or unsupported",
            Self::StreamError(_) => "check the system audio settings",
            Self::PlaybackError(_) => "restart the application",
        }
    }
}
