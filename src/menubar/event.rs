//! Event handling for tray menu interactions.
//!
//! This module handles:
//! - Menu item identifiers and their mapping to actions
//! - Updates pushed from the daemon to the tray
//!
//! The event types and id mapping are platform-independent.
//! Actual event handling with tray-icon is done in the platform-specific code.

use std::fmt;

use crate::types::{Phase, TimerSnapshot};

// ============================================================================
// MenuAction
// ============================================================================

/// Actions that can be triggered from the tray menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Start, resume or pause depending on the state
    StartPause,
    /// Stop and reset the timer
    Reset,
    /// Show or hide the floating overlay
    ToggleOverlay,
    /// Open the settings file
    OpenSettings,
    /// Select the noise for a phase
    SelectNoise {
        /// Phase whose noise is changed
        phase: Phase,
        /// Noise library key
        key: String,
    },
    /// Open the credits file
    Credits,
    /// Quit the daemon
    Quit,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuAction::StartPause => write!(f, "start_pause"),
            MenuAction::Reset => write!(f, "reset"),
            MenuAction::ToggleOverlay => write!(f, "toggle_overlay"),
            MenuAction::OpenSettings => write!(f, "settings"),
            MenuAction::SelectNoise { phase, key } => {
                write!(f, "noise:{}:{}", phase.noise_slot(), key)
            }
            MenuAction::Credits => write!(f, "credits"),
            MenuAction::Quit => write!(f, "quit"),
        }
    }
}

// ============================================================================
// MenuItemId
// ============================================================================

/// Identifier of a tray menu item.
///
/// The string form is what tray-icon stores as the native item id. Noise
/// items encode their slot and key, e.g. `noise:work:Rain`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuItemId(String);

impl MenuItemId {
    /// Start/resume/pause item
    pub const START_PAUSE: &'static str = "start_pause";
    /// Stop timer item
    pub const STOP_TIMER: &'static str = "stop_timer";
    /// Status line (disabled)
    pub const STATUS: &'static str = "status";
    /// Show timer check item
    pub const SHOW_TIMER: &'static str = "show_timer";
    /// Settings item
    pub const SETTINGS: &'static str = "settings";
    /// Credits item
    pub const CREDITS: &'static str = "credits";
    /// Quit item
    pub const QUIT: &'static str = "quit";

    const NOISE_PREFIX: &'static str = "noise:";

    /// Wraps a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id of a noise radio item.
    pub fn noise(phase: Phase, key: &str) -> Self {
        Self(format!("{}{}:{}", Self::NOISE_PREFIX, phase.noise_slot(), key))
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the id to the corresponding action.
    ///
    /// Returns `None` for items that don't trigger actions, like the status
    /// line, and for unknown ids.
    pub fn to_action(&self) -> Option<MenuAction> {
        match self.0.as_str() {
            Self::START_PAUSE => Some(MenuAction::StartPause),
            Self::STOP_TIMER => Some(MenuAction::Reset),
            Self::SHOW_TIMER => Some(MenuAction::ToggleOverlay),
            Self::SETTINGS => Some(MenuAction::OpenSettings),
            Self::CREDITS => Some(MenuAction::Credits),
            Self::QUIT => Some(MenuAction::Quit),
            id => {
                let rest = id.strip_prefix(Self::NOISE_PREFIX)?;
                let (slot, key) = rest.split_once(':')?;
                let phase = match slot {
                    "work" => Phase::Working,
                    "break" => Phase::OnBreak,
                    _ => return None,
                };
                Some(MenuAction::SelectNoise {
                    phase,
                    key: key.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// EventHandler
// ============================================================================

/// Converts menu clicks to actions.
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    /// Creates a new EventHandler.
    pub fn new() -> Self {
        Self
    }

    /// Processes a menu item click and returns the corresponding action.
    pub fn handle_click(&self, item_id: &MenuItemId) -> Option<MenuAction> {
        let action = item_id.to_action();

        match &action {
            Some(action) => tracing::info!(action = %action, "Tray menu action"),
            None => tracing::debug!(id = %item_id, "Ignoring tray menu item"),
        }

        action
    }

    /// Logs the result of an action execution.
    pub fn log_action_result(&self, action: &MenuAction, changed: bool) {
        tracing::debug!(action = %action, changed, "Tray menu action handled");
    }
}

// ============================================================================
// TrayView / TrayUpdate
// ============================================================================

/// Everything the tray renders, taken from one engine snapshot and the
/// current settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TrayView {
    /// Timer snapshot
    pub snapshot: TimerSnapshot,
    /// Selected work noise
    pub work_noise: String,
    /// Selected break noise
    pub break_noise: String,
    /// Whether the overlay is shown
    pub show_timer: bool,
}

impl TrayView {
    /// Returns the selected noise for a phase.
    pub fn noise_for(&self, phase: Phase) -> &str {
        match phase {
            Phase::Working => &self.work_noise,
            Phase::OnBreak => &self.break_noise,
        }
    }
}

/// Updates sent from the daemon loop to the tray.
///
/// Sent over a crossbeam channel so the tray can live on the main thread.
#[derive(Debug, Clone)]
pub enum TrayUpdate {
    /// Re-render title and menu from a new view
    Refresh(TrayView),
    /// Shut the tray icon down
    Shutdown,
}

// ============================================================================
// Tests
// ============================================================================
