//! LeanFocus Library
//!
//! This library provides the core functionality of the LeanFocus focus timer.
//! It includes:
//! - Timer engine with a cancellable clock driver
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Settings persistence and the local noise library
//! - Looping ambient noise playback
//! - Tray menu (macOS) and floating overlay observers

pub mod app;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod i18n;
pub mod menubar;
pub mod overlay;
pub mod sound;
pub mod types;

pub use app::FocusApp;

// Re-export commonly used types for convenience
pub use types::{
    IpcRequest, IpcResponse, Phase, PhaseDurations, ResponseData, TimerSnapshot, TimerState,
};

pub use config::{ConfigError, ConfigPort, ConfigStore, FocusConfig};

pub use daemon::{DaemonOptions, DriverStats, TimerEngine, TimerEvent};

// Re-export menubar types
pub use menubar::{
    EventHandler, IconManager, MenuAction, MenuBuilder, MenuConfig, MenuItemConfig, MenuItemId,
    TrayIconManager, TrayUpdate, TrayView,
};

pub use overlay::{
    ClickTracker, Gesture, OverlayFrame, OverlayPoller, OverlaySink, PointerEvent,
};

// Re-export sound types
pub use sound::{MockSoundPort, NoiseLibrary, SilentPlayer, SoundError, SoundPort};
