//! Persisted settings.
//!
//! Missing fields take their defaults, so configuration files written by
//! older versions keep loading.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sound::{NoiseLibrary, NONE_KEY};
use crate::types::{Phase, PhaseDurations, DEFAULT_BREAK_SECONDS, DEFAULT_WORK_SECONDS};

/// Noise value written by early versions for "no noise".
const LEGACY_NONE_KEY: &str = "なし";

/// Accepted work phase range in seconds.
pub const WORK_SECONDS_RANGE: std::ops::RangeInclusive<u32> = 60..=7200;

/// Accepted break phase range in seconds.
pub const BREAK_SECONDS_RANGE: std::ops::RangeInclusive<u32> = 60..=3600;

/// Accepted overlay font sizes.
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<u32> = 6..=72;

fn default_work_seconds() -> u32 {
    DEFAULT_WORK_SECONDS
}

fn default_break_seconds() -> u32 {
    DEFAULT_BREAK_SECONDS
}

fn default_noise() -> String {
    NONE_KEY.to_string()
}

fn default_volume() -> f32 {
    1.0
}

fn default_font_size() -> u32 {
    24
}

fn default_opacity() -> f32 {
    0.7
}

/// Application settings stored in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Work phase length in seconds
    #[serde(default = "default_work_seconds")]
    pub work_seconds: u32,
    /// Break phase length in seconds
    #[serde(default = "default_break_seconds")]
    pub break_seconds: u32,
    /// Noise key played during work
    #[serde(default = "default_noise")]
    pub work_noise: String,
    /// Noise key played during breaks
    #[serde(default = "default_noise")]
    pub break_noise: String,
    /// Playback volume, 0.0 to 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Whether the floating overlay is shown
    #[serde(default)]
    pub show_timer: bool,
    /// Overlay font size
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Overlay opacity, 0.1 to 1.0
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Saved overlay x position
    #[serde(default)]
    pub window_x: Option<i32>,
    /// Saved overlay y position
    #[serde(default)]
    pub window_y: Option<i32>,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            work_seconds: default_work_seconds(),
            break_seconds: default_break_seconds(),
            work_noise: default_noise(),
            break_noise: default_noise(),
            volume: default_volume(),
            show_timer: false,
            font_size: default_font_size(),
            opacity: default_opacity(),
            window_x: None,
            window_y: None,
        }
    }
}

impl FocusConfig {
    /// Returns the configured phase durations.
    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations::new(self.work_seconds, self.break_seconds)
    }

    /// Returns the noise key for a phase.
    pub fn noise_for(&self, phase: Phase) -> &str {
        match phase {
            Phase::Working => &self.work_noise,
            Phase::OnBreak => &self.break_noise,
        }
    }

    /// Returns a mutable reference to the noise key of a phase.
    pub fn noise_for_mut(&mut self, phase: Phase) -> &mut String {
        match phase {
            Phase::Working => &mut self.work_noise,
            Phase::OnBreak => &mut self.break_noise,
        }
    }

    /// Returns the saved overlay position, if both coordinates are known.
    pub fn window_position(&self) -> Option<(i32, i32)> {
        self.window_x.zip(self.window_y)
    }

    /// Replaces out-of-range or unknown values with defaults.
    ///
    /// Each replacement is logged.
    #[must_use]
    pub fn normalized(mut self, library: &NoiseLibrary) -> Self {
        for phase in [Phase::Working, Phase::OnBreak] {
            let slot = phase.noise_slot();
            let noise = self.noise_for_mut(phase);
            if noise == LEGACY_NONE_KEY {
                *noise = NONE_KEY.to_string();
            }
            if !library.contains(noise) {
                warn!("Unknown {} noise '{}', using {}", slot, noise, NONE_KEY);
                *noise = NONE_KEY.to_string();
            }
        }

        if !WORK_SECONDS_RANGE.contains(&self.work_seconds) {
            warn!(
                "Work duration {}s out of range, using {}s",
                self.work_seconds, DEFAULT_WORK_SECONDS
            );
            self.work_seconds = DEFAULT_WORK_SECONDS;
        }
        if !BREAK_SECONDS_RANGE.contains(&self.break_seconds) {
            warn!(
                "Break duration {}s out of range, using {}s",
                self.break_seconds, DEFAULT_BREAK_SECONDS
            );
            self.break_seconds = DEFAULT_BREAK_SECONDS;
        }

        self.volume = clamp_unit(self.volume, default_volume(), 0.0);
        self.opacity = clamp_unit(self.opacity, default_opacity(), 0.1);
        self.font_size = self
            .font_size
            .clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end());
        self
    }
}

/// Clamps to `[min, 1.0]`, replacing NaN with the fallback.
pub(crate) fn clamp_unit(value: f32, fallback: f32, min: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, 1.0)
    }
}
