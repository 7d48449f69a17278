//! IPC Server for LeanFocus.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer and settings commands
//! - Dispatch to [`FocusApp`]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::app::FocusApp;
use crate::daemon::timer::TimerEvent;
use crate::types::{IpcRequest, IpcResponse, Phase, ResponseData, TimerState};

// ============================================================================
// Constants
// ============================================================================

/// Socket location relative to the home directory.
pub const DEFAULT_SOCKET_PATH: &str = ".leanfocus/leanfocus.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns the default socket path under the home directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(DEFAULT_SOCKET_PATH))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// The client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// The request is not valid JSON for any command
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max 4096 bytes)")]
    RequestTooLarge,
}

impl IpcError {
    /// Returns true if the client should be told about the failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::RequestTooLarge)
    }
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest, IpcError> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string())),
            Err(_) => return Err(IpcError::Timeout),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed);
        }
        if n == MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge);
        }

        Ok(serde_json::from_slice(&buffer[..n])?)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Serves one client connection: one request, one response.
pub async fn handle_connection(mut stream: UnixStream, handler: Arc<RequestHandler>) {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => {
            debug!("IPC request: {:?}", request);
            handler.handle(request).await
        }
        Err(e) if e.is_client_error() => IpcResponse::error(e.to_string()),
        Err(e) => {
            debug!("Dropping IPC connection: {}", e);
            return;
        }
    };

    if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
        warn!("Failed to send IPC response: {:#}", e);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the application.
pub struct RequestHandler {
    app: Arc<FocusApp>,
}

impl RequestHandler {
    /// Creates a new request handler for the given application.
    pub fn new(app: Arc<FocusApp>) -> Self {
        Self { app }
    }

    /// Handles an IPC request and returns the appropriate response.
    ///
    /// Timer operations that do not apply to the current state succeed
    /// without changing anything; the message says so.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Pause => {
                let changed = self.app.engine().pause().await;
                self.respond(changed, "Timer paused", "Timer is not running")
            }
            IpcRequest::Toggle => {
                let message = match self.app.engine().toggle().await {
                    Some(TimerEvent::Started) => "Timer started",
                    Some(TimerEvent::Resumed { .. }) => "Timer resumed",
                    Some(TimerEvent::Paused { .. }) => "Timer paused",
                    _ => "Timer unchanged",
                };
                self.respond(true, message, "")
            }
            IpcRequest::Reset => {
                let changed = self.app.engine().reset().await;
                self.respond(changed, "Timer reset", "Timer is already stopped")
            }
            IpcRequest::Restart => {
                let changed = self.app.engine().restart_and_pause().await;
                self.respond(changed, "Timer restarted and paused", "Timer is stopped")
            }
            IpcRequest::Status => self.respond(true, "", ""),
            IpcRequest::Noise { kind, key } => self.handle_noise(kind, &key).await,
            IpcRequest::Volume { volume } => self.handle_volume(volume),
            IpcRequest::Style { font_size, opacity } => self.handle_style(font_size, opacity),
            IpcRequest::Overlay => {
                let shown = self.app.toggle_overlay();
                self.respond(true, if shown { "Overlay shown" } else { "Overlay hidden" }, "")
            }
            IpcRequest::Quit => {
                self.app.quit();
                IpcResponse::success("Shutting down", None)
            }
        }
    }

    async fn handle_start(&self) -> IpcResponse {
        let resuming = self.app.snapshot().state == TimerState::Paused;
        let changed = self.app.engine().start().await;
        let message = if resuming { "Timer resumed" } else { "Timer started" };
        self.respond(changed, message, "Timer is already running")
    }

    async fn handle_noise(&self, phase: Phase, key: &str) -> IpcResponse {
        if !self.app.set_noise(phase, key).await {
            return IpcResponse::error(format!("Unknown noise: {}", key));
        }
        let slot = match phase {
            Phase::Working => "Work",
            Phase::OnBreak => "Break",
        };
        self.respond(true, &format!("{} noise set to {}", slot, key), "")
    }

    fn handle_volume(&self, volume: f32) -> IpcResponse {
        if !volume.is_finite() {
            return IpcResponse::error("Volume must be a number between 0.0 and 1.0");
        }
        let volume = self.app.set_volume(volume);
        self.respond(true, &format!("Volume set to {:.2}", volume), "")
    }

    fn handle_style(&self, font_size: u32, opacity: f32) -> IpcResponse {
        if !opacity.is_finite() {
            return IpcResponse::error("Opacity must be a number between 0.1 and 1.0");
        }
        let (font_size, opacity) = self.app.set_visual(font_size, opacity);
        let message = format!("Overlay style set to {}pt at {:.2} opacity", font_size, opacity);
        self.respond(true, &message, "")
    }

    fn respond(&self, changed: bool, changed_message: &str, unchanged_message: &str) -> IpcResponse {
        let message = if changed {
            changed_message
        } else {
            unchanged_message
        };
        let snapshot = self.app.snapshot();
        IpcResponse::success(message, Some(ResponseData::from_snapshot(&snapshot)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, FocusConfig};
    use crate::sound::{MockSoundPort, NoiseLibrary};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        (dir, path)
    }

    fn create_handler() -> (RequestHandler, Arc<FocusApp>) {
        let library = Arc::new(NoiseLibrary::from_entries([("Rain", "/sounds/rain.ogg")]));
        let config = Arc::new(ConfigStore::in_memory(FocusConfig::default(), library));
        let (app, _rx) = FocusApp::new(config, Arc::new(MockSoundPort::new()), "/assets");
        let app = Arc::new(app);
        (RequestHandler::new(Arc::clone(&app)), app)
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let (_dir, socket_path) = create_temp_socket_path();
            std::fs::write(&socket_path, "dummy").unwrap();

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_receive_request_status() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(br#"{"command":"status"}"#).await.unwrap();
                stream.flush().await.unwrap();
                stream
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(matches!(request, Ok(IpcRequest::Status)));
            drop(client_handle.await.unwrap());
        }

        #[tokio::test]
        async fn test_receive_request_noise() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream
                    .write_all(br#"{"command":"noise","kind":"break","key":"Rain"}"#)
                    .await
                    .unwrap();
                stream
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();
            assert_eq!(
                request,
                IpcRequest::Noise {
                    kind: Phase::OnBreak,
                    key: "Rain".to_string()
                }
            );
            drop(client_handle.await.unwrap());
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json").await.unwrap();
                stream
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            let err = request.unwrap_err();
            assert!(matches!(err, IpcError::InvalidRequest(_)));
            assert!(err.is_client_error());
            drop(client_handle.await.unwrap());
        }

        #[tokio::test]
        async fn test_closed_connection() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                let stream = UnixStream::connect(&client_path).await.unwrap();
                drop(stream);
            });

            let mut stream = server.accept().await.unwrap();
            client_handle.await.unwrap();
            let err = IpcServer::receive_request(&mut stream).await.unwrap_err();
            assert!(matches!(err, IpcError::ConnectionClosed));
            assert!(!err.is_client_error());
        }

        #[tokio::test]
        async fn test_send_response() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let mut buffer = Vec::new();
                stream.read_to_end(&mut buffer).await.unwrap();
                serde_json::from_slice::<IpcResponse>(&buffer).unwrap()
            });

            let mut stream = server.accept().await.unwrap();
            let response = IpcResponse::success("Test message", None);
            IpcServer::send_response(&mut stream, &response).await.unwrap();
            drop(stream);

            let received = client_handle.await.unwrap();
            assert!(received.is_success());
            assert_eq!(received.message, "Test message");
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let (_dir, socket_path) = create_temp_socket_path();
            {
                let server = IpcServer::new(&socket_path).unwrap();
                assert_eq!(server.socket_path(), socket_path);
                assert!(socket_path.exists());
            }
            assert!(!socket_path.exists());
        }

        #[test]
        fn test_default_socket_path() {
            if let Ok(path) = default_socket_path() {
                assert!(path.ends_with(".leanfocus/leanfocus.sock"));
            }
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status() {
            let (handler, _app) = create_handler();
            let response = handler.handle(IpcRequest::Status).await;

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.state.as_deref(), Some("stopped"));
            assert_eq!(data.remaining_seconds, Some(1500));
            assert_eq!(data.display.as_deref(), Some("--:--"));
            assert_eq!(data.resume_state, None);
        }

        #[tokio::test(start_paused = true)]
        async fn test_handle_start_and_repeat() {
            let (handler, app) = create_handler();

            let response = handler.handle(IpcRequest::Start).await;
            assert_eq!(response.message, "Timer started");
            assert_eq!(response.data.unwrap().state.as_deref(), Some("working"));

            let response = handler.handle(IpcRequest::Start).await;
            assert!(response.is_success());
            assert_eq!(response.message, "Timer is already running");

            app.shutdown().await;
        }

        #[tokio::test(start_paused = true)]
        async fn test_handle_pause_and_resume() {
            let (handler, app) = create_handler();
            handler.handle(IpcRequest::Start).await;

            let response = handler.handle(IpcRequest::Pause).await;
            assert_eq!(response.message, "Timer paused");
            let data = response.data.unwrap();
            assert_eq!(data.state.as_deref(), Some("paused"));
            assert_eq!(data.resume_state.as_deref(), Some("working"));

            let response = handler.handle(IpcRequest::Start).await;
            assert_eq!(response.message, "Timer resumed");

            app.shutdown().await;
        }

        #[tokio::test]
        async fn test_handle_pause_not_running() {
            let (handler, _app) = create_handler();
            let response = handler.handle(IpcRequest::Pause).await;
            assert!(response.is_success());
            assert_eq!(response.message, "Timer is not running");
        }

        #[tokio::test(start_paused = true)]
        async fn test_handle_toggle_and_restart() {
            let (handler, _app) = create_handler();

            let response = handler.handle(IpcRequest::Toggle).await;
            assert_eq!(response.message, "Timer started");
            let response = handler.handle(IpcRequest::Toggle).await;
            assert_eq!(response.message, "Timer paused");

            let response = handler.handle(IpcRequest::Restart).await;
            assert_eq!(response.message, "Timer restarted and paused");
            assert_eq!(response.data.unwrap().remaining_seconds, Some(1500));

            let response = handler.handle(IpcRequest::Reset).await;
            assert_eq!(response.message, "Timer reset");
            let response = handler.handle(IpcRequest::Restart).await;
            assert_eq!(response.message, "Timer is stopped");
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
        async fn test_concurrent_toggles_alternate() {
            let (handler, app) = create_handler();
            let handler = Arc::new(handler);

            let mut handles = Vec::new();
            for _ in 0..20 {
                let handler = Arc::clone(&handler);
                handles.push(tokio::spawn(async move {
                    handler.handle(IpcRequest::Toggle).await.message
                }));
            }
            let mut messages = Vec::new();
            for handle in handles {
                messages.push(handle.await.unwrap());
            }

            let paused = messages.iter().filter(|m| *m == "Timer paused").count();
            let started = messages.iter().filter(|m| *m == "Timer started").count();
            let resumed = messages.iter().filter(|m| *m == "Timer resumed").count();
            assert_eq!((started, resumed, paused), (1, 9, 10), "{:?}", messages);
            assert_eq!(app.snapshot().state, TimerState::Paused);
            app.shutdown().await;
        }

        #[tokio::test]
        async fn test_handle_noise() {
            let (handler, app) = create_handler();

            let response = handler
                .handle(IpcRequest::Noise {
                    kind: Phase::Working,
                    key: "Rain".to_string(),
                })
                .await;
            assert_eq!(response.message, "Work noise set to Rain");
            assert_eq!(app.tray_view().work_noise, "Rain");

            let response = handler
                .handle(IpcRequest::Noise {
                    kind: Phase::OnBreak,
                    key: "Thunder".to_string(),
                })
                .await;
            assert!(!response.is_success());
            assert!(response.message.contains("Thunder"));
        }

        #[tokio::test]
        async fn test_handle_volume() {
            let (handler, app) = create_handler();

            let response = handler.handle(IpcRequest::Volume { volume: 0.25 }).await;
            assert_eq!(response.message, "Volume set to 0.25");
            assert_eq!(app.config().snapshot().volume, 0.25);

            let response = handler.handle(IpcRequest::Volume { volume: f32::NAN }).await;
            assert!(!response.is_success());
        }

        #[tokio::test]
        async fn test_handle_style_clamps_and_stores() {
            let (handler, app) = create_handler();

            let response = handler
                .handle(IpcRequest::Style {
                    font_size: 32,
                    opacity: 0.5,
                })
                .await;
            assert_eq!(response.message, "Overlay style set to 32pt at 0.50 opacity");

            let response = handler
                .handle(IpcRequest::Style {
                    font_size: 200,
                    opacity: 0.01,
                })
                .await;
            assert_eq!(response.message, "Overlay style set to 72pt at 0.10 opacity");
            let config = app.config().snapshot();
            assert_eq!((config.font_size, config.opacity), (72, 0.1));

            let response = handler
                .handle(IpcRequest::Style {
                    font_size: 24,
                    opacity: f32::INFINITY,
                })
                .await;
            assert!(!response.is_success());
        }

        #[tokio::test]
        async fn test_handle_overlay_and_quit() {
            let (handler, app) = create_handler();

            let response = handler.handle(IpcRequest::Overlay).await;
            assert_eq!(response.message, "Overlay shown");

            let token = app.quit_token();
            let response = handler.handle(IpcRequest::Quit).await;
            assert!(response.is_success());
            assert!(token.is_cancelled());
        }
    }
}
