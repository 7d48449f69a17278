//! Menu building for the tray.
//!
//! This module handles:
//! - Menu item configuration (text, enabled, check marks)
//! - The start/resume/pause label and the status line for each timer state
//! - Work and break noise radio submenus
//!
//! The configuration logic is platform-independent and fully testable.
//! Actual menu creation using tray-icon is done in the platform-specific code.

use crate::i18n::Lang;
use crate::sound::NONE_KEY;
use crate::types::{Phase, TimerSnapshot, TimerState};

use super::event::{MenuItemId, TrayView};

// ============================================================================
// MenuItemConfig
// ============================================================================

/// Configuration for a menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemConfig {
    /// Native item id
    pub id: MenuItemId,
    /// Display text for the menu item
    pub text: String,
    /// Whether the menu item is enabled (clickable)
    pub enabled: bool,
    /// Check mark state, `None` for plain items
    pub checked: Option<bool>,
}

impl MenuItemConfig {
    /// Creates a plain, enabled item.
    pub fn new(id: &str, text: impl Into<String>) -> Self {
        Self {
            id: MenuItemId::new(id),
            text: text.into(),
            enabled: true,
            checked: None,
        }
    }

    /// Creates a disabled informational item.
    pub fn label(id: &str, text: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(id, text)
        }
    }

    /// Creates a check item.
    pub fn check(id: MenuItemId, text: impl Into<String>, checked: bool) -> Self {
        Self {
            id,
            text: text.into(),
            enabled: true,
            checked: Some(checked),
        }
    }
}

/// A noise selection submenu.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseMenuConfig {
    /// Submenu title
    pub title: String,
    /// Radio items, "None" first
    pub items: Vec<MenuItemConfig>,
}

// ============================================================================
// MenuConfig
// ============================================================================

/// Complete menu configuration for one tray view.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuConfig {
    /// Start, resume or pause
    pub start_pause: MenuItemConfig,
    /// Stop and reset
    pub stop_timer: MenuItemConfig,
    /// Status line (disabled)
    pub status: MenuItemConfig,
    /// Overlay visibility
    pub show_timer: MenuItemConfig,
    /// Settings
    pub settings: MenuItemConfig,
    /// Work noise submenu
    pub work_noise: NoiseMenuConfig,
    /// Break noise submenu
    pub break_noise: NoiseMenuConfig,
    /// Credits
    pub credits: MenuItemConfig,
    /// Quit (always enabled)
    pub quit: MenuItemConfig,
}

// ============================================================================
// MenuBuilder
// ============================================================================

/// Builds menu configuration from a tray view.
#[derive(Debug, Clone)]
pub struct MenuBuilder {
    lang: Lang,
    noise_keys: Vec<String>,
}

impl MenuBuilder {
    /// Creates a builder for the given language and noise keys.
    ///
    /// The keys are listed in the submenus with "None" first and the rest
    /// sorted.
    pub fn new<I, S>(lang: Lang, noise_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = noise_keys
            .into_iter()
            .map(Into::into)
            .filter(|k| k != NONE_KEY)
            .collect();
        keys.sort();
        keys.dedup();
        keys.insert(0, NONE_KEY.to_string());
        Self {
            lang,
            noise_keys: keys,
        }
    }

    /// Returns the language labels are taken from.
    pub fn lang(&self) -> Lang {
        self.lang
    }

    /// Builds a complete menu configuration.
    pub fn build(&self, view: &TrayView) -> MenuConfig {
        let lang = self.lang;
        MenuConfig {
            start_pause: MenuItemConfig::new(
                MenuItemId::START_PAUSE,
                self.start_pause_text(view.snapshot.state),
            ),
            stop_timer: MenuItemConfig::new(MenuItemId::STOP_TIMER, lang.tr("stop_timer")),
            status: MenuItemConfig::label(MenuItemId::STATUS, self.status_text(&view.snapshot)),
            show_timer: MenuItemConfig::check(
                MenuItemId::new(MenuItemId::SHOW_TIMER),
                lang.tr("show_timer"),
                view.show_timer,
            ),
            settings: MenuItemConfig::new(MenuItemId::SETTINGS, lang.tr("settings_menu")),
            work_noise: self.noise_menu(Phase::Working, view),
            break_noise: self.noise_menu(Phase::OnBreak, view),
            credits: MenuItemConfig::new(MenuItemId::CREDITS, lang.tr("credits")),
            quit: MenuItemConfig::new(MenuItemId::QUIT, lang.tr("quit")),
        }
    }

    /// Label of the start/pause item.
    pub fn start_pause_text(&self, state: TimerState) -> &'static str {
        let key = match state {
            TimerState::Stopped => "start",
            TimerState::Paused => "resume",
            TimerState::Working | TimerState::OnBreak => "pause",
        };
        self.lang.tr(key)
    }

    /// Status line, e.g. `Status: Working (Left 15:30)`.
    pub fn status_text(&self, snapshot: &TimerSnapshot) -> String {
        let state = self.lang.tr(match snapshot.state {
            TimerState::Stopped => "state_stopped",
            TimerState::Working => "state_work",
            TimerState::OnBreak => "state_break",
            TimerState::Paused => "state_paused",
        });
        self.lang
            .tr("status_fmt")
            .replace("{state}", state)
            .replace("{time}", &snapshot.clock_text())
    }

    fn noise_menu(&self, phase: Phase, view: &TrayView) -> NoiseMenuConfig {
        let title = match phase {
            Phase::Working => "work_noise",
            Phase::OnBreak => "break_noise",
        };
        let selected = view.noise_for(phase);
        let items = self
            .noise_keys
            .iter()
            .map(|key| {
                let text = if key == NONE_KEY {
                    self.lang.tr("none").to_string()
                } else {
                    key.clone()
                };
                MenuItemConfig::check(MenuItemId::noise(phase, key), text, key == selected)
            })
            .collect();

        NoiseMenuConfig {
            title: self.lang.tr(title).to_string(),
            items,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
