//! Core data types for LeanFocus.
//!
//! This module defines the data structures used for:
//! - Timer state and phase identification
//! - Phase durations
//! - Consistent snapshots read by the overlay and tray observers
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

/// Default work phase length in seconds (25 minutes).
pub const DEFAULT_WORK_SECONDS: u32 = 25 * 60;

/// Default break phase length in seconds (5 minutes).
pub const DEFAULT_BREAK_SECONDS: u32 = 5 * 60;

/// Placeholder shown instead of a countdown while the timer is stopped.
pub const STOPPED_PLACEHOLDER: &str = "--:--";

// ============================================================================
// Phase
// ============================================================================

/// A running phase of the focus cycle.
///
/// Also identifies which noise slot (work or break) a sound belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Focused work interval
    #[serde(alias = "work")]
    Working,
    /// Break interval
    #[serde(alias = "break")]
    OnBreak,
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Working => "working",
            Phase::OnBreak => "on_break",
        }
    }

    /// Returns the configuration slot name for this phase's noise.
    pub fn noise_slot(&self) -> &'static str {
        match self {
            Phase::Working => "work",
            Phase::OnBreak => "break",
        }
    }

    /// Returns the phase that follows this one at a boundary.
    pub fn next(&self) -> Phase {
        match self {
            Phase::Working => Phase::OnBreak,
            Phase::OnBreak => Phase::Working,
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Working
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Represents the current state of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// Idle, countdown reset to the full work duration
    Stopped,
    /// Counting down a work phase
    Working,
    /// Counting down a break phase
    OnBreak,
    /// Countdown frozen, waiting to resume
    Paused,
}

impl TimerState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Stopped => "stopped",
            TimerState::Working => "working",
            TimerState::OnBreak => "on_break",
            TimerState::Paused => "paused",
        }
    }

    /// Returns true if the countdown is actively running.
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Working | TimerState::OnBreak)
    }

    /// Returns the running phase, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            TimerState::Working => Some(Phase::Working),
            TimerState::OnBreak => Some(Phase::OnBreak),
            TimerState::Stopped | TimerState::Paused => None,
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::Stopped
    }
}

impl From<Phase> for TimerState {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Working => TimerState::Working,
            Phase::OnBreak => TimerState::OnBreak,
        }
    }
}

// ============================================================================
// PhaseDurations
// ============================================================================

/// Lengths of the two phases, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    /// Work phase length in seconds
    pub work_seconds: u32,
    /// Break phase length in seconds
    pub break_seconds: u32,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            work_seconds: DEFAULT_WORK_SECONDS,
            break_seconds: DEFAULT_BREAK_SECONDS,
        }
    }
}

impl PhaseDurations {
    /// Creates durations from explicit second counts.
    pub fn new(work_seconds: u32, break_seconds: u32) -> Self {
        Self {
            work_seconds,
            break_seconds,
        }
    }

    /// Returns the full length of the given phase.
    pub fn for_phase(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Working => self.work_seconds,
            Phase::OnBreak => self.break_seconds,
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// A consistent view of the session, taken under a single lock acquisition.
///
/// Observers render exclusively from snapshots so a transition in flight can
/// never be seen half-applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Current state
    pub state: TimerState,
    /// Seconds left in the current phase
    pub remaining_seconds: u32,
    /// Phase a paused session resumes into
    pub resume_phase: Phase,
}

impl TimerSnapshot {
    /// Formats the countdown as `MM:SS`, or the placeholder while stopped.
    pub fn clock_text(&self) -> String {
        if self.state == TimerState::Stopped {
            STOPPED_PLACEHOLDER.to_string()
        } else {
            format_clock(self.remaining_seconds)
        }
    }

    /// Returns the resume phase only while paused.
    pub fn paused_into(&self) -> Option<Phase> {
        (self.state == TimerState::Paused).then_some(self.resume_phase)
    }
}

/// Formats seconds as `MM:SS`.
///
/// Minutes are not wrapped at 60, so 7200 seconds renders as `120:00`.
pub fn format_clock(total_seconds: u32) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start or resume the timer
    Start,
    /// Pause the running timer
    Pause,
    /// Pause if running, otherwise start
    Toggle,
    /// Stop and reset to the full work duration
    Reset,
    /// Refill the resume phase and pause
    Restart,
    /// Query the current status
    Status,
    /// Change the noise used for a phase
    Noise {
        /// Phase whose noise is changed
        kind: Phase,
        /// Noise library key ("None" for silence)
        key: String,
    },
    /// Change the playback volume
    Volume {
        /// Volume between 0.0 and 1.0
        volume: f32,
    },
    /// Change the overlay font size and opacity
    Style {
        /// Font size in points
        font_size: u32,
        /// Window opacity, 0.1 to 1.0
        opacity: f32,
    },
    /// Show or hide the floating overlay
    Overlay,
    /// Shut the daemon down
    Quit,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Remaining seconds
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// Phase a paused timer resumes into
    #[serde(rename = "resumeState", skip_serializing_if = "Option::is_none")]
    pub resume_state: Option<String>,
    /// Countdown as shown by the observers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl ResponseData {
    /// Creates response data from a timer snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            state: Some(snapshot.state.as_str().to_string()),
            remaining_seconds: Some(snapshot.remaining_seconds),
            resume_state: snapshot.paused_into().map(|p| p.as_str().to_string()),
            display: Some(snapshot.clock_text()),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Phase / TimerState Tests
    // ------------------------------------------------------------------------

    mod state_tests {
        use super::*;

        #[test]
        fn test_default_state_is_stopped() {
            assert_eq!(TimerState::default(), TimerState::Stopped);
            assert_eq!(Phase::default(), Phase::Working);
        }

        #[test]
        fn test_is_running() {
            assert!(!TimerState::Stopped.is_running());
            assert!(TimerState::Working.is_running());
            assert!(TimerState::OnBreak.is_running());
            assert!(!TimerState::Paused.is_running());
        }

        #[test]
        fn test_phase_of_state() {
            assert_eq!(TimerState::Working.phase(), Some(Phase::Working));
            assert_eq!(TimerState::OnBreak.phase(), Some(Phase::OnBreak));
            assert_eq!(TimerState::Paused.phase(), None);
            assert_eq!(TimerState::Stopped.phase(), None);
        }

        #[test]
        fn test_next_phase_alternates() {
            assert_eq!(Phase::Working.next(), Phase::OnBreak);
            assert_eq!(Phase::OnBreak.next(), Phase::Working);
        }

        #[test]
        fn test_state_serialization() {
            let json = serde_json::to_string(&TimerState::OnBreak).unwrap();
            assert_eq!(json, "\"on_break\"");
        }

        #[test]
        fn test_phase_accepts_noise_slot_alias() {
            let phase: Phase = serde_json::from_str("\"break\"").unwrap();
            assert_eq!(phase, Phase::OnBreak);
            let phase: Phase = serde_json::from_str("\"working\"").unwrap();
            assert_eq!(phase, Phase::Working);
        }
    }

    // ------------------------------------------------------------------------
    // Snapshot Formatting Tests
    // ------------------------------------------------------------------------

    mod snapshot_tests {
        use super::*;

        fn snapshot(state: TimerState, remaining_seconds: u32) -> TimerSnapshot {
            TimerSnapshot {
                state,
                remaining_seconds,
                resume_phase: Phase::OnBreak,
            }
        }

        #[test]
        fn test_format_clock() {
            assert_eq!(format_clock(0), "00:00");
            assert_eq!(format_clock(59), "00:59");
            assert_eq!(format_clock(1500), "25:00");
            assert_eq!(format_clock(7200), "120:00");
        }

        #[test]
        fn test_stopped_shows_placeholder() {
            assert_eq!(snapshot(TimerState::Stopped, 1500).clock_text(), "--:--");
        }

        #[test]
        fn test_running_shows_countdown() {
            assert_eq!(snapshot(TimerState::Working, 930).clock_text(), "15:30");
            assert_eq!(snapshot(TimerState::Paused, 0).clock_text(), "00:00");
        }

        #[test]
        fn test_paused_into_only_when_paused() {
            assert_eq!(
                snapshot(TimerState::Paused, 10).paused_into(),
                Some(Phase::OnBreak)
            );
            assert_eq!(snapshot(TimerState::OnBreak, 10).paused_into(), None);
        }

        #[test]
        fn test_durations_for_phase() {
            let durations = PhaseDurations::default();
            assert_eq!(durations.for_phase(Phase::Working), 1500);
            assert_eq!(durations.for_phase(Phase::OnBreak), 300);
        }
    }

    // ------------------------------------------------------------------------
    // IPC Type Tests
    // ------------------------------------------------------------------------

    mod ipc_tests {
        use super::*;

        #[test]
        fn test_request_tags() {
            let json = serde_json::to_string(&IpcRequest::Restart).unwrap();
            assert_eq!(json, r#"{"command":"restart"}"#);

            let request: IpcRequest = serde_json::from_str(r#"{"command":"status"}"#).unwrap();
            assert_eq!(request, IpcRequest::Status);
        }

        #[test]
        fn test_noise_request_parses_slot_name() {
            let request: IpcRequest =
                serde_json::from_str(r#"{"command":"noise","kind":"work","key":"Rain"}"#).unwrap();
            assert_eq!(
                request,
                IpcRequest::Noise {
                    kind: Phase::Working,
                    key: "Rain".to_string()
                }
            );
        }

        #[test]
        fn test_response_data_from_paused_snapshot() {
            let data = ResponseData::from_snapshot(&TimerSnapshot {
                state: TimerState::Paused,
                remaining_seconds: 299,
                resume_phase: Phase::OnBreak,
            });
            assert_eq!(data.state.as_deref(), Some("paused"));
            assert_eq!(data.remaining_seconds, Some(299));
            assert_eq!(data.resume_state.as_deref(), Some("on_break"));
            assert_eq!(data.display.as_deref(), Some("04:59"));
        }

        #[test]
        fn test_response_skips_empty_fields() {
            let response = IpcResponse::error("boom");
            let json = serde_json::to_string(&response).unwrap();
            assert!(!json.contains("data"));
            assert!(!response.is_success());
        }
    }
}
