//! Application facade.
//!
//! [`FocusApp`] is the single entry point for every control surface: IPC
//! requests, tray menu actions and overlay gestures all end up here. It owns
//! the timer engine and wires settings changes to it.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigPort, ConfigStore};
use crate::daemon::timer::{TimerEngine, TimerEvent};
use crate::menubar::{MenuAction, TrayView};
use crate::overlay::Gesture;
use crate::sound::SoundPort;
use crate::types::{Phase, TimerSnapshot};

/// Credits file name inside the assets directory.
pub const CREDITS_FILE: &str = "CREDITS.txt";

/// The running application.
pub struct FocusApp {
    engine: TimerEngine,
    config: Arc<ConfigStore>,
    sound: Arc<dyn SoundPort>,
    assets_dir: PathBuf,
    quit: CancellationToken,
}

impl FocusApp {
    /// Creates the application with a stopped timer.
    ///
    /// Returns the receiver of timer events alongside.
    pub fn new(
        config: Arc<ConfigStore>,
        sound: Arc<dyn SoundPort>,
        assets_dir: impl Into<PathBuf>,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let port: Arc<dyn ConfigPort> = config.clone();
        let engine = TimerEngine::with_events(port, Arc::clone(&sound), tx);
        let app = Self {
            engine,
            config,
            sound,
            assets_dir: assets_dir.into(),
            quit: CancellationToken::new(),
        };
        (app, rx)
    }

    /// Returns the timer engine.
    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    /// Returns the settings store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Returns the current timer snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    /// Returns everything the tray renders.
    pub fn tray_view(&self) -> TrayView {
        let config = self.config.snapshot();
        TrayView {
            snapshot: self.engine.snapshot(),
            work_noise: config.work_noise,
            break_noise: config.break_noise,
            show_timer: config.show_timer,
        }
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Selects the noise for a phase and applies it at once if that phase is
    /// running.
    ///
    /// Returns false if the key is not in the noise library.
    pub async fn set_noise(&self, phase: Phase, key: &str) -> bool {
        if !self.config.set_noise(phase, key) {
            return false;
        }
        self.engine.refresh_sound(phase).await;
        true
    }

    /// Stores the volume and applies it to the current playback.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = self.config.set_volume(volume);
        self.sound.set_volume(volume);
        volume
    }

    /// Stores the overlay font size and opacity. Returns the stored values.
    pub fn set_visual(&self, font_size: u32, opacity: f32) -> (u32, f32) {
        let (font_size, opacity) = self.config.set_visual(font_size, opacity);
        info!(font_size, opacity, "Overlay style changed");
        (font_size, opacity)
    }

    /// Flips overlay visibility and returns the new value.
    pub fn toggle_overlay(&self) -> bool {
        let shown = self.config.toggle_show_timer();
        info!("Overlay {}", if shown { "shown" } else { "hidden" });
        shown
    }

    /// Applies an overlay pointer gesture.
    ///
    /// A click toggles the timer. A drag stores the window position.
    pub async fn handle_gesture(&self, gesture: Gesture, window_position: (i32, i32)) {
        match gesture {
            Gesture::Click => {
                self.engine.toggle().await;
            }
            Gesture::Drag => {
                self.config
                    .set_window_position(window_position.0, window_position.1);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Tray
    // ------------------------------------------------------------------------

    /// Dispatches a tray menu action. Returns whether anything changed.
    pub async fn handle_menu_action(&self, action: MenuAction) -> bool {
        match action {
            MenuAction::StartPause => self.engine.toggle().await.is_some(),
            MenuAction::Reset => self.engine.reset().await,
            MenuAction::ToggleOverlay => {
                self.toggle_overlay();
                true
            }
            MenuAction::OpenSettings => self.open_settings(),
            MenuAction::SelectNoise { phase, key } => self.set_noise(phase, &key).await,
            MenuAction::Credits => self.open_credits(),
            MenuAction::Quit => {
                self.quit();
                true
            }
        }
    }

    /// Opens the credits file with the platform opener.
    ///
    /// Failures are logged. Returns whether the opener was launched. Must be
    /// called within a tokio runtime, which reaps the opener.
    pub fn open_credits(&self) -> bool {
        let path = self.assets_dir.join(CREDITS_FILE);
        if !path.is_file() {
            warn!("Credits file not found: {}", path.display());
            return false;
        }
        log_open_result(&path, open_path(&path))
    }

    /// Opens the configuration file with the platform opener.
    pub fn open_settings(&self) -> bool {
        let Some(path) = self.config.path() else {
            warn!("Settings are not backed by a file");
            return false;
        };
        if let Err(e) = self.config.save() {
            warn!("Failed to write settings before opening: {}", e);
        }
        log_open_result(path, open_path(path))
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Requests the daemon to shut down.
    pub fn quit(&self) {
        info!("Quit requested");
        self.quit.cancel();
    }

    /// Token cancelled when quit is requested.
    pub fn quit_token(&self) -> CancellationToken {
        self.quit.clone()
    }

    /// Stops the driver and playback.
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }
}

impl std::fmt::Debug for FocusApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusApp")
            .field("engine", &self.engine)
            .field("assets_dir", &self.assets_dir)
            .finish_non_exhaustive()
    }
}

fn log_open_result(path: &Path, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to open {}: {:#}", path.display(), e);
            false
        }
    }
}

/// Opens a file with the platform's default application.
fn open_path(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };

    let child = command
        .arg(path)
        .spawn()
        .with_context(|| format!("Failed to launch opener for {}", path.display()))?;
    reap_opener(child, path.to_path_buf());
    Ok(())
}

/// Waits for an opener on the blocking pool so it does not linger as a zombie.
fn reap_opener(mut child: Child, path: PathBuf) -> tokio::task::JoinHandle<Option<ExitStatus>> {
    tokio::task::spawn_blocking(move || match child.wait() {
        Ok(status) => {
            if !status.success() {
                warn!("Opener for {} exited with {}", path.display(), status);
            }
            Some(status)
        }
        Err(e) => {
            warn!("Failed to wait for opener of {}: {}", path.display(), e);
            None
        }
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FocusConfig;
    use crate::sound::{MockSoundPort, NoiseLibrary, SoundCall};
    use crate::types::TimerState;

    fn create_app() -> (FocusApp, Arc<MockSoundPort>) {
        let library = Arc::new(NoiseLibrary::from_entries([
            ("Rain", "/sounds/rain.ogg"),
            ("Cafe", "/sounds/cafe.mp3"),
        ]));
        let config = Arc::new(ConfigStore::in_memory(FocusConfig::default(), library));
        let sound = Arc::new(MockSoundPort::new());
        let (app, _rx) = FocusApp::new(config, sound.clone(), "/nonexistent-assets");
        (app, sound)
    }

    mod settings_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_set_noise_for_running_phase_plays_now() {
            let (app, sound) = create_app();
            app.engine().start().await;
            sound.clear_calls();

            assert!(app.set_noise(Phase::Working, "Rain").await);

            assert_eq!(sound.played_keys(), vec!["Rain".to_string()]);
            app.shutdown().await;
        }

        #[tokio::test(start_paused = true)]
        async fn test_set_noise_for_other_phase_waits() {
            let (app, sound) = create_app();
            app.engine().start().await;
            sound.clear_calls();

            assert!(app.set_noise(Phase::OnBreak, "Cafe").await);

            assert!(sound.played_keys().is_empty());
            assert_eq!(app.tray_view().break_noise, "Cafe");
            app.shutdown().await;
        }

        #[tokio::test]
        async fn test_unknown_noise_is_rejected() {
            let (app, sound) = create_app();
            assert!(!app.set_noise(Phase::Working, "Thunder").await);
            assert!(sound.calls().is_empty());
        }

        #[test]
        fn test_set_volume_applies_to_player() {
            let (app, sound) = create_app();
            assert_eq!(app.set_volume(2.0), 1.0);
            assert_eq!(sound.last_call(), Some(SoundCall::SetVolume(1.0)));
        }

        #[test]
        fn test_toggle_overlay() {
            let (app, _sound) = create_app();
            assert!(app.toggle_overlay());
            assert!(app.tray_view().show_timer);
        }
    }

    mod control_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_click_toggles_timer() {
            let (app, _sound) = create_app();
            app.handle_gesture(Gesture::Click, (0, 0)).await;
            assert_eq!(app.snapshot().state, TimerState::Working);
            app.handle_gesture(Gesture::Click, (0, 0)).await;
            assert_eq!(app.snapshot().state, TimerState::Paused);
        }

        #[tokio::test]
        async fn test_drag_stores_position() {
            let (app, _sound) = create_app();
            app.handle_gesture(Gesture::Drag, (320, 200)).await;
            assert_eq!(app.config().snapshot().window_position(), Some((320, 200)));
            assert_eq!(app.snapshot().state, TimerState::Stopped);
        }

        #[tokio::test(start_paused = true)]
        async fn test_menu_actions() {
            let (app, _sound) = create_app();
            assert!(app.handle_menu_action(MenuAction::StartPause).await);
            assert_eq!(app.snapshot().state, TimerState::Working);
            assert!(app.handle_menu_action(MenuAction::Reset).await);
            assert_eq!(app.snapshot().state, TimerState::Stopped);
            assert!(
                app.handle_menu_action(MenuAction::SelectNoise {
                    phase: Phase::Working,
                    key: "Rain".to_string()
                })
                .await
            );
            assert_eq!(app.tray_view().work_noise, "Rain");
        }

        #[tokio::test]
        async fn test_quit_cancels_token() {
            let (app, _sound) = create_app();
            let token = app.quit_token();
            assert!(!token.is_cancelled());
            assert!(app.handle_menu_action(MenuAction::Quit).await);
            assert!(token.is_cancelled());
        }

        #[tokio::test]
        async fn test_opener_is_waited_for() {
            let child = Command::new("true").spawn().unwrap();
            let status = reap_opener(child, PathBuf::from("CREDITS.txt")).await.unwrap();
            assert!(status.unwrap().success());

            let child = Command::new("false").spawn().unwrap();
            let status = reap_opener(child, PathBuf::from("config.json")).await.unwrap();
            assert!(!status.unwrap().success());
        }

        #[tokio::test]
        async fn test_missing_credits_and_settings_files() {
            let (app, _sound) = create_app();
            assert!(!app.open_credits());
            assert!(!app.open_settings());
        }
    }
}
