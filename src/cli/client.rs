//! IPC Client for communicating with the LeanFocus daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::default_socket_path;
use crate::types::{IpcRequest, IpcResponse, Phase};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: usize = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug)]
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
    /// Attempts per request
    max_retries: u32,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(default_socket_path()?))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
        }
    }

    /// Creates a client for `socket`, or the default socket when `None`.
    pub fn for_socket(socket: Option<PathBuf>) -> Result<Self> {
        match socket {
            Some(path) => Ok(Self::with_socket_path(path)),
            None => Self::new(),
        }
    }

    /// Sends each request once, without retrying.
    #[must_use]
    pub fn without_retries(mut self) -> Self {
        self.max_retries = 1;
        self
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Starts or resumes the timer.
    pub async fn start(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Start).await
    }

    /// Pauses the timer.
    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Pause).await
    }

    /// Starts or pauses depending on the state.
    pub async fn toggle(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Toggle).await
    }

    /// Stops the timer.
    pub async fn reset(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Reset).await
    }

    /// Restarts the current phase, paused.
    pub async fn restart(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Restart).await
    }

    /// Queries the timer status.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    /// Selects the noise for a phase.
    pub async fn noise(&self, kind: Phase, key: &str) -> Result<IpcResponse> {
        let request = IpcRequest::Noise {
            kind,
            key: key.to_string(),
        };
        self.send_request_with_retry(&request).await
    }

    /// Sets the playback volume.
    pub async fn volume(&self, volume: f32) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Volume { volume })
            .await
    }

    /// Sets the overlay font size and opacity.
    pub async fn style(&self, font_size: u32, opacity: f32) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Style { font_size, opacity })
            .await
    }

    /// Shows or hides the overlay.
    pub async fn overlay(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Overlay).await
    }

    /// Asks the daemon to quit.
    pub async fn quit(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Quit).await
    }

    /// Sends a request to the daemon with retry logic.
    ///
    /// Error responses from the daemon are returned at once.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut attempt = 1;
        loop {
            match self.send_request(request).await {
                Ok(response) => return Self::check(response),
                Err(e) if attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {:#}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn check(response: IpcResponse) -> Result<IpcResponse> {
        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }
        Ok(response)
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .context("Cannot connect to the daemon. Start it with 'leanfocus run'")?;

        let request_json =
            serde_json::to_string(request).context("Failed to serialize request")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("Write timed out")?
        .context("Failed to send request")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("Flush timed out")?
            .context("Failed to flush request")?;

        // Shutdown write side to signal end of request
        stream.shutdown().await.context("Failed to shut down write side")?;

        let mut buffer = vec![0u8; MAX_RESPONSE_SIZE];
        let n = timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if n == 0 {
            anyhow::bail!("The daemon sent no response");
        }

        serde_json::from_slice(&buffer[..n]).context("Failed to parse response")
    }
}

// ============================================================================
// Tests
// ============================================================================
