//! Ambient noise playback for LeanFocus.
//!
//! This module provides:
//!
//! - Noise discovery from the assets sound directory
//! - Looping, single-voice playback through rodio
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   TimerEngine    │
//! └────────┬─────────┘
//!          │ SoundPort::play / stop
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ RodioNoisePlayer │────▶│   audio thread   │
//! │                  │     │  (one rodio Sink)│
//! └────────┬─────────┘     └──────────────────┘
//!          │ key → file
//!          ▼
//! ┌──────────────────┐
//! │   NoiseLibrary   │
//! └──────────────────┘
//! ```

mod error;
mod library;
mod player;

pub use error::SoundError;
pub use library::{NoiseLibrary, NONE_KEY, SOUND_NAMES_FILE};
pub use player::{try_create_player, RodioNoisePlayer};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Audio output used by the timer engine.
///
/// The output is single-voice: `play` replaces whatever is currently playing.
pub trait SoundPort: Send + Sync {
    /// Starts looping the noise with the given key, stopping any current noise.
    ///
    /// The silent key [`NONE_KEY`] only stops playback.
    ///
    /// # Errors
    ///
    /// Returns an error if the noise cannot be played. Playback is stopped
    /// in that case.
    fn play(&self, noise_key: &str, volume: f32) -> Result<(), SoundError>;

    /// Stops playback.
    fn stop(&self);

    /// Changes the volume of the current and future playback.
    fn set_volume(&self, volume: f32);
}

/// Sound port used when no audio device is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl SoundPort for SilentPlayer {
    fn play(&self, noise_key: &str, _volume: f32) -> Result<(), SoundError> {
        tracing::debug!("Audio unavailable, not playing {}", noise_key);
        Ok(())
    }

    fn stop(&self) {}

    fn set_volume(&self, _volume: f32) {}
}

/// A call recorded by [`MockSoundPort`].
#[derive(Debug, Clone, PartialEq)]
pub enum SoundCall {
    /// `play(key, volume)`
    Play {
        /// Noise key
        key: String,
        /// Requested volume
        volume: f32,
    },
    /// `stop()`
    Stop,
    /// `set_volume(volume)`
    SetVolume(f32),
}

/// Mock sound port for testing.
#[derive(Debug, Default)]
pub struct MockSoundPort {
    calls: Mutex<Vec<SoundCall>>,
    should_fail: AtomicBool,
}

impl MockSoundPort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<SoundCall> {
        self.lock().clone()
    }

    /// Returns the keys passed to `play`, in order.
    #[must_use]
    pub fn played_keys(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                SoundCall::Play { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|call| matches!(call, SoundCall::Stop))
            .count()
    }

    /// Returns the most recent call, if any.
    #[must_use]
    pub fn last_call(&self) -> Option<SoundCall> {
        self.lock().last().cloned()
    }

    pub fn clear_calls(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SoundCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SoundPort for MockSoundPort {
    fn play(&self, noise_key: &str, volume: f32) -> Result<(), SoundError> {
        self.lock().push(SoundCall::Play {
            key: noise_key.to_string(),
            volume,
        });
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        Ok(())
    }

    fn stop(&self) {
        self.lock().push(SoundCall::Stop);
    }

    fn set_volume(&self, volume: f32) {
        self.lock().push(SoundCall::SetVolume(volume));
    }
}
