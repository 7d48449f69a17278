//! Tray title text.
//!
//! On macOS the tray shows a short title next to the icon, e.g. "🎧 15:30".
//! The text generation is platform-independent and fully testable.

use crate::types::{TimerSnapshot, TimerState};

// ============================================================================
// Constants
// ============================================================================

/// Prefix while working
const WORKING_PREFIX: &str = "🎧";

/// Prefix while on break
const BREAK_PREFIX: &str = "☕";

/// Prefix while paused
const PAUSED_PREFIX: &str = "⏸";

// ============================================================================
// IconManager
// ============================================================================

/// Generates the tray title and skips redundant updates.
#[derive(Debug, Default)]
pub struct IconManager {
    last_title: Option<String>,
}

impl IconManager {
    /// Creates a new IconManager.
    pub fn new() -> Self {
        Self { last_title: None }
    }

    /// Generates the title for a snapshot.
    ///
    /// Format:
    /// - Working: "🎧 MM:SS"
    /// - OnBreak: "☕ MM:SS"
    /// - Paused: "⏸ MM:SS"
    /// - Stopped: empty, the bare icon is shown
    pub fn generate_title(&self, snapshot: &TimerSnapshot) -> String {
        let prefix = match snapshot.state {
            TimerState::Stopped => return String::new(),
            TimerState::Working => WORKING_PREFIX,
            TimerState::OnBreak => BREAK_PREFIX,
            TimerState::Paused => PAUSED_PREFIX,
        };
        format!("{} {}", prefix, snapshot.clock_text())
    }

    /// Returns the new title if it differs from the last one returned.
    pub fn title_if_changed(&mut self, snapshot: &TimerSnapshot) -> Option<String> {
        let title = self.generate_title(snapshot);
        if self.last_title.as_deref() == Some(title.as_str()) {
            return None;
        }
        self.last_title = Some(title.clone());
        Some(title)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;

    fn snapshot(state: TimerState, remaining_seconds: u32) -> TimerSnapshot {
        TimerSnapshot {
            state,
            remaining_seconds,
            resume_phase: Phase::Working,
        }
    }

    #[test]
    fn test_titles_by_state() {
        let manager = IconManager::new();
        assert_eq!(manager.generate_title(&snapshot(TimerState::Stopped, 1500)), "");
        assert_eq!(
            manager.generate_title(&snapshot(TimerState::Working, 930)),
            "🎧 15:30"
        );
        assert_eq!(
            manager.generate_title(&snapshot(TimerState::OnBreak, 299)),
            "☕ 04:59"
        );
        assert_eq!(
            manager.generate_title(&snapshot(TimerState::Paused, 60)),
            "⏸ 01:00"
        );
    }

    #[test]
    fn test_title_if_changed() {
        let mut manager = IconManager::new();
        let s = snapshot(TimerState::Working, 100);
        assert!(manager.title_if_changed(&s).is_some());
        assert!(manager.title_if_changed(&s).is_none());
        assert!(manager
            .title_if_changed(&snapshot(TimerState::Working, 99))
            .is_some());
    }
}
