//! Daemon module for LeanFocus.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with state transitions and the clock driver
//! - `ipc`: Unix socket server and request dispatch
//!
//! [`run`] wires everything together and drives the observers (tray and
//! overlay) from a single poll loop until Ctrl-C or a quit request.

pub mod ipc;
pub mod timer;

pub use ipc::{default_socket_path, IpcError, IpcServer, RequestHandler};
pub use timer::{DriverStats, TimerEngine, TimerEvent};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::FocusApp;
use crate::config::ConfigStore;
use crate::i18n;
use crate::menubar::{MenuBuilder, TrayIconManager, TrayUpdate};
use crate::overlay::{OverlayPoller, TerminalOverlay, POLL_INTERVAL};
use crate::sound::{self, NoiseLibrary};

/// Sound directory inside the assets directory.
pub const SOUNDS_DIR: &str = "sounds";

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Socket to listen on
    pub socket_path: PathBuf,
    /// Configuration file
    pub config_path: PathBuf,
    /// Assets directory holding `sounds/` and the credits file
    pub assets_dir: PathBuf,
    /// Print the overlay to the terminal
    pub terminal_overlay: bool,
}

/// Runs the daemon until Ctrl-C or a quit request.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let lang = i18n::current();
    let library = Arc::new(NoiseLibrary::scan(
        &options.assets_dir.join(SOUNDS_DIR),
        lang,
    ));
    info!("Found {} noise file(s)", library.len());

    let config = Arc::new(ConfigStore::load(&options.config_path, Arc::clone(&library)));
    let player = sound::try_create_player(Arc::clone(&library));
    let (app, events) = FocusApp::new(config, player, &options.assets_dir);
    let app = Arc::new(app);

    let server = IpcServer::new(&options.socket_path)?;
    info!("Listening on {}", server.socket_path().display());

    let (tray_tx, tray_rx) = crossbeam_channel::unbounded();
    let mut tray = TrayIconManager::new(MenuBuilder::new(lang, library.keys()), tray_rx);
    if let Err(e) = tray.initialize() {
        warn!("Tray unavailable: {:#}", e);
    }

    let overlay = options
        .terminal_overlay
        .then(|| OverlayPoller::new(Box::new(TerminalOverlay::stdout())));

    let result = serve(&app, &server, events, &mut tray, &tray_tx, overlay).await;

    let _ = tray_tx.send(TrayUpdate::Shutdown);
    tray.process_pending_update();
    app.shutdown().await;
    info!("Daemon stopped");
    result
}

async fn serve(
    app: &Arc<FocusApp>,
    server: &IpcServer,
    mut events: mpsc::UnboundedReceiver<TimerEvent>,
    tray: &mut TrayIconManager,
    tray_tx: &crossbeam_channel::Sender<TrayUpdate>,
    mut overlay: Option<OverlayPoller>,
) -> Result<()> {
    let handler = Arc::new(RequestHandler::new(Arc::clone(app)));
    let quit = app.quit_token();
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = quit.cancelled() => break,
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupted");
                break;
            }
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    tokio::spawn(ipc::handle_connection(stream, Arc::clone(&handler)));
                }
                Err(e) => warn!("{:#}", e),
            },
            Some(event) = events.recv() => {
                debug!("Timer event: {:?}", event);
                refresh_tray(app, tray, tray_tx);
            }
            _ = poll.tick() => {
                if let Some(overlay) = overlay.as_mut() {
                    overlay.poll(&app.snapshot(), &app.config().snapshot());
                    for (gesture, window) in overlay.take_gestures() {
                        app.handle_gesture(gesture, window).await;
                    }
                }
                refresh_tray(app, tray, tray_tx);
                while let Some(action) = tray.poll_action() {
                    let changed = app.handle_menu_action(action.clone()).await;
                    tray.event_handler().log_action_result(&action, changed);
                }
            }
        }
    }
    Ok(())
}

fn refresh_tray(
    app: &FocusApp,
    tray: &mut TrayIconManager,
    tray_tx: &crossbeam_channel::Sender<TrayUpdate>,
) {
    if tray_tx.send(TrayUpdate::Refresh(app.tray_view())).is_ok() {
        tray.process_pending_update();
    }
}
