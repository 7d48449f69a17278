//! Tray menu UI for LeanFocus.
//!
//! This module provides:
//! - Tray icon management (macOS menu bar)
//! - Live countdown title (e.g., "🎧 15:30")
//! - Menu with start/pause, stop, status line, overlay toggle, settings,
//!   noise submenus, credits and quit
//! - Event handling for menu interactions
//!
//! # Architecture
//!
//! The module is split into platform-independent and platform-specific parts:
//!
//! - `icon.rs`: Title text generation (platform-independent, fully testable)
//! - `menu.rs`: Menu configuration (platform-independent, fully testable)
//! - `event.rs`: Event types and handling (platform-independent, fully testable)
//! - `mod.rs`: TrayIconManager (platform-specific on macOS)
//!
//! # Usage
//!
//! The tray is an observer. The daemon loop polls the engine, builds a
//! [`TrayView`] and sends it over a crossbeam channel; the manager renders
//! whatever view arrived last.
//!
//! ```ignore
//! use leanfocus::menubar::{MenuBuilder, TrayIconManager, TrayUpdate};
//! use crossbeam_channel::unbounded;
//!
//! let (tx, rx) = unbounded();
//! let mut manager = TrayIconManager::new(MenuBuilder::new(lang, keys), rx);
//! manager.initialize()?;
//!
//! tx.send(TrayUpdate::Refresh(view))?;
//! manager.process_pending_update();
//! ```

pub mod event;
pub mod icon;
pub mod menu;

// Re-export main types
pub use event::{EventHandler, MenuAction, MenuItemId, TrayUpdate, TrayView};
pub use icon::IconManager;
pub use menu::{MenuBuilder, MenuConfig, MenuItemConfig, NoiseMenuConfig};

use crossbeam_channel::{Receiver, TryRecvError};

// ============================================================================
// TrayIconManager
// ============================================================================

/// Manages the tray icon and its menu.
///
/// On macOS it owns the actual tray-icon instance. On other platforms it
/// keeps the rendered state only, so the daemon runs headless.
pub struct TrayIconManager {
    /// Icon manager for title generation
    icon_manager: IconManager,
    /// Menu builder for menu configuration
    menu_builder: MenuBuilder,
    /// Event handler for menu clicks
    event_handler: EventHandler,
    /// Last view received
    current_view: Option<TrayView>,
    /// Menu configuration of the last view
    current_menu: Option<MenuConfig>,
    /// Channel for receiving updates from the daemon loop
    update_rx: Receiver<TrayUpdate>,
    /// Whether the manager is initialized
    initialized: bool,
    /// Platform-specific tray icon instance (macOS only)
    #[cfg(target_os = "macos")]
    tray_icon: Option<tray_icon::TrayIcon>,
}

impl TrayIconManager {
    /// Creates a new TrayIconManager.
    ///
    /// On macOS, the actual tray icon is not created until `initialize()`
    /// is called.
    pub fn new(menu_builder: MenuBuilder, update_rx: Receiver<TrayUpdate>) -> Self {
        Self {
            icon_manager: IconManager::new(),
            menu_builder,
            event_handler: EventHandler::new(),
            current_view: None,
            current_menu: None,
            update_rx,
            initialized: false,
            #[cfg(target_os = "macos")]
            tray_icon: None,
        }
    }

    /// Returns whether the manager is initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the last view received.
    pub fn current_view(&self) -> Option<&TrayView> {
        self.current_view.as_ref()
    }

    /// Returns the menu configuration of the last view.
    pub fn current_menu(&self) -> Option<&MenuConfig> {
        self.current_menu.as_ref()
    }

    /// Returns a reference to the event handler.
    pub fn event_handler(&self) -> &EventHandler {
        &self.event_handler
    }

    /// Applies all pending updates.
    ///
    /// Returns `true` if at least one update was processed.
    pub fn process_pending_update(&mut self) -> bool {
        let mut processed = false;
        loop {
            match self.update_rx.try_recv() {
                Ok(update) => {
                    self.handle_update(update);
                    processed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.initialized {
                        tracing::warn!("Tray update channel disconnected");
                        self.shutdown();
                    }
                    break;
                }
            }
        }
        processed
    }

    fn handle_update(&mut self, update: TrayUpdate) {
        match update {
            TrayUpdate::Refresh(view) => self.render(view),
            TrayUpdate::Shutdown => {
                tracing::info!("Shutting down tray");
                self.shutdown();
            }
        }
    }

    fn render(&mut self, view: TrayView) {
        if let Some(title) = self.icon_manager.title_if_changed(&view.snapshot) {
            tracing::trace!(title = %title, "Tray title");
            #[cfg(target_os = "macos")]
            if let Some(ref tray_icon) = self.tray_icon {
                tray_icon.set_title(Some(&title));
            }
        }

        let menu = self.menu_builder.build(&view);
        if self.current_menu.as_ref() != Some(&menu) {
            tracing::debug!("Rebuilding tray menu");
            #[cfg(target_os = "macos")]
            if let Some(ref tray_icon) = self.tray_icon {
                match build_native_menu(&menu) {
                    Ok(native) => tray_icon.set_menu(Some(Box::new(native))),
                    Err(e) => tracing::warn!("Failed to rebuild tray menu: {}", e),
                }
            }
            self.current_menu = Some(menu);
        }
        self.current_view = Some(view);
    }

    /// Returns the next clicked menu action, if any.
    pub fn poll_action(&self) -> Option<MenuAction> {
        #[cfg(target_os = "macos")]
        {
            let event = tray_icon::menu::MenuEvent::receiver().try_recv().ok()?;
            self.event_handler
                .handle_click(&MenuItemId::new(event.id.0.clone()))
        }
        #[cfg(not(target_os = "macos"))]
        {
            None
        }
    }

    /// Shuts down the tray icon.
    pub fn shutdown(&mut self) {
        self.initialized = false;
        #[cfg(target_os = "macos")]
        {
            self.tray_icon = None;
        }
    }

    /// Initializes the tray icon (macOS only).
    ///
    /// This must be called from the main thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the tray icon cannot be created.
    #[cfg(target_os = "macos")]
    pub fn initialize(&mut self) -> anyhow::Result<()> {
        use anyhow::Context;
        use tray_icon::TrayIconBuilder;

        let mut builder = TrayIconBuilder::new().with_tooltip(self.menu_builder.lang().tr("tooltip"));
        if let Some(menu) = &self.current_menu {
            builder = builder.with_menu(Box::new(build_native_menu(menu)?));
        }
        if let Some(view) = &self.current_view {
            builder = builder.with_title(self.icon_manager.generate_title(&view.snapshot));
        }

        let tray_icon = builder.build().context("Failed to create tray icon")?;

        self.tray_icon = Some(tray_icon);
        self.initialized = true;

        tracing::info!("Tray icon initialized");
        Ok(())
    }

    /// Initializes the tray icon (non-macOS, no-op).
    #[cfg(not(target_os = "macos"))]
    pub fn initialize(&mut self) -> anyhow::Result<()> {
        tracing::debug!("Tray icon is only supported on macOS, running headless");
        self.initialized = true;
        Ok(())
    }
}

/// Builds a native menu from the configuration (macOS only).
#[cfg(target_os = "macos")]
fn build_native_menu(config: &MenuConfig) -> anyhow::Result<tray_icon::menu::Menu> {
    use tray_icon::menu::{CheckMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu};

    fn item(config: &MenuItemConfig) -> MenuItem {
        MenuItem::with_id(config.id.as_str(), &config.text, config.enabled, None)
    }

    fn check(config: &MenuItemConfig) -> CheckMenuItem {
        CheckMenuItem::with_id(
            config.id.as_str(),
            &config.text,
            config.enabled,
            config.checked.unwrap_or(false),
            None,
        )
    }

    fn noise_submenu(config: &NoiseMenuConfig) -> anyhow::Result<Submenu> {
        let submenu = Submenu::new(&config.title, true);
        for entry in &config.items {
            submenu.append(&check(entry))?;
        }
        Ok(submenu)
    }

    let menu = Menu::new();
    menu.append(&item(&config.start_pause))?;
    menu.append(&item(&config.stop_timer))?;
    menu.append(&PredefinedMenuItem::separator())?;
    menu.append(&item(&config.status))?;
    menu.append(&PredefinedMenuItem::separator())?;
    menu.append(&check(&config.show_timer))?;
    menu.append(&item(&config.settings))?;
    menu.append(&PredefinedMenuItem::separator())?;
    menu.append(&noise_submenu(&config.work_noise)?)?;
    menu.append(&noise_submenu(&config.break_noise)?)?;
    menu.append(&PredefinedMenuItem::separator())?;
    menu.append(&item(&config.credits))?;
    menu.append(&PredefinedMenuItem::separator())?;
    menu.append(&item(&config.quit))?;
    Ok(menu)
}

impl std::fmt::Debug for TrayIconManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrayIconManager")
            .field("initialized", &self.initialized)
            .field("icon_manager", &self.icon_manager)
            .field("menu_builder", &self.menu_builder)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Lang;
    use crate::types::{Phase, TimerSnapshot, TimerState};
    use crossbeam_channel::unbounded;

    fn view(state: TimerState, remaining_seconds: u32) -> TrayView {
        TrayView {
            snapshot: TimerSnapshot {
                state,
                remaining_seconds,
                resume_phase: Phase::Working,
            },
            work_noise: "None".to_string(),
            break_noise: "Rain".to_string(),
            show_timer: false,
        }
    }

    fn manager() -> (crossbeam_channel::Sender<TrayUpdate>, TrayIconManager) {
        let (tx, rx) = unbounded();
        let builder = MenuBuilder::new(Lang::En, ["Rain"]);
        (tx, TrayIconManager::new(builder, rx))
    }

    mod manager_tests {
        use super::*;

        #[test]
        fn test_new() {
            let (_tx, manager) = manager();
            assert!(!manager.is_initialized());
            assert!(manager.current_view().is_none());
            assert!(manager.poll_action().is_none());
        }

        #[test]
        fn test_process_pending_update_empty() {
            let (_tx, mut manager) = manager();
            assert!(!manager.process_pending_update());
        }

        #[test]
        fn test_latest_view_wins() {
            let (tx, mut manager) = manager();
            tx.send(TrayUpdate::Refresh(view(TimerState::Working, 900))).unwrap();
            tx.send(TrayUpdate::Refresh(view(TimerState::Paused, 899))).unwrap();

            assert!(manager.process_pending_update());

            let current = manager.current_view().unwrap();
            assert_eq!(current.snapshot.state, TimerState::Paused);
            let menu = manager.current_menu().unwrap();
            assert_eq!(menu.start_pause.text, "Resume Timer");
            assert_eq!(menu.status.text, "Status: Paused (Left 14:59)");
        }

        #[test]
        fn test_shutdown_update() {
            let (tx, mut manager) = manager();
            manager.initialized = true;

            tx.send(TrayUpdate::Shutdown).unwrap();
            manager.process_pending_update();

            assert!(!manager.is_initialized());
        }

        #[test]
        fn test_disconnect_shuts_down() {
            let (tx, mut manager) = manager();
            manager.initialized = true;
            drop(tx);

            assert!(!manager.process_pending_update());
            assert!(!manager.is_initialized());
        }

        #[test]
        fn test_debug() {
            let (_tx, manager) = manager();
            let debug = format!("{:?}", manager);
            assert!(debug.contains("TrayIconManager"));
            assert!(debug.contains("initialized"));
        }
    }

    #[cfg(not(target_os = "macos"))]
    mod non_macos_tests {
        use super::*;

        #[test]
        fn test_initialize_non_macos() {
            let (_tx, mut manager) = manager();
            assert!(manager.initialize().is_ok());
            assert!(manager.is_initialized());
        }
    }
}
