//! Noise player implementation using rodio.
//!
//! The rodio output stream is not `Send`, so it lives on a dedicated audio
//! thread. The player handle talks to that thread over a crossbeam channel;
//! commands are applied in order, which keeps the output single-voice: a new
//! noise always stops the previous sink before it starts.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rodio::{Decoder, OutputStream, Sink, Source};
use tracing::{debug, warn};

use super::error::SoundError;
use super::library::{NoiseLibrary, NONE_KEY};
use super::SoundPort;

/// Commands processed by the audio thread.
#[derive(Debug)]
enum AudioCommand {
    Play { path: PathBuf, volume: f32 },
    Stop,
    SetVolume(f32),
    Shutdown,
}

/// Loops ambient noise files through the default audio output.
pub struct RodioNoisePlayer {
    library: Arc<NoiseLibrary>,
    commands: Sender<AudioCommand>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RodioNoisePlayer {
    /// Starts the audio thread and opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(library: Arc<NoiseLibrary>) -> Result<Self, SoundError> {
        let (commands, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        let thread = std::thread::Builder::new()
            .name("leanfocus-audio".to_string())
            .spawn(move || audio_thread(rx, ready_tx))
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(SoundError::StreamError(
                    "audio thread exited during startup".to_string(),
                ));
            }
        }

        debug!("Audio output stream initialized");

        Ok(Self {
            library,
            commands,
            thread: Mutex::new(Some(thread)),
        })
    }

    fn send(&self, command: AudioCommand) -> Result<(), SoundError> {
        self.commands
            .send(command)
            .map_err(|_| SoundError::PlaybackError("audio thread is not running".to_string()))
    }
}

impl SoundPort for RodioNoisePlayer {
    fn play(&self, noise_key: &str, volume: f32) -> Result<(), SoundError> {
        // Stop first so an unknown or missing noise never leaves the old one playing.
        self.send(AudioCommand::Stop)?;

        if noise_key == NONE_KEY {
            return Ok(());
        }
        let path = self
            .library
            .path(noise_key)
            .ok_or_else(|| SoundError::UnknownNoise(noise_key.to_string()))?;
        if !path.is_file() {
            return Err(SoundError::FileNotFound(path.display().to_string()));
        }

        debug!("Playing noise: {}", noise_key);
        self.send(AudioCommand::Play {
            path: path.to_path_buf(),
            volume: volume.clamp(0.0, 1.0),
        })
    }

    fn stop(&self) {
        if let Err(e) = self.send(AudioCommand::Stop) {
            warn!("Failed to stop noise: {}", e);
        }
    }

    fn set_volume(&self, volume: f32) {
        if let Err(e) = self.send(AudioCommand::SetVolume(volume.clamp(0.0, 1.0))) {
            warn!("Failed to change volume: {}", e);
        }
    }
}

impl Drop for RodioNoisePlayer {
    fn drop(&mut self) {
        let _ = self.commands.send(AudioCommand::Shutdown);
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for RodioNoisePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioNoisePlayer")
            .field("noises", &self.library.len())
            .finish_non_exhaustive()
    }
}

fn audio_thread(rx: Receiver<AudioCommand>, ready: Sender<Result<(), SoundError>>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => {
            let _ = ready.send(Ok(()));
            output
        }
        Err(e) => {
            let _ = ready.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
            return;
        }
    };

    let mut current: Option<Sink> = None;

    for command in rx.iter() {
        match command {
            AudioCommand::Play { path, volume } => {
                if let Some(sink) = current.take() {
                    sink.stop();
                }
                match open_looped(&path) {
                    Ok(decoder) => match Sink::try_new(&handle) {
                        Ok(sink) => {
                            sink.set_volume(volume);
                            sink.append(decoder);
                            current = Some(sink);
                        }
                        Err(e) => warn!("Failed to create audio sink: {}", e),
                    },
                    Err(e) => warn!("{}", e),
                }
            }
            AudioCommand::Stop => {
                if let Some(sink) = current.take() {
                    sink.stop();
                }
            }
            AudioCommand::SetVolume(volume) => {
                if let Some(sink) = &current {
                    sink.set_volume(volume);
                }
            }
            AudioCommand::Shutdown => break,
        }
    }

    if let Some(sink) = current.take() {
        sink.stop();
    }
    debug!("Audio thread stopped");
}

fn open_looped(path: &Path) -> Result<impl Source<Item = i16> + Send + 'static, SoundError> {
    let file = File::open(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Decoder::new_looped(BufReader::new(file))
        .map_err(|e| SoundError::DecodeError(format!("{}: {}", path.display(), e)))
}

/// Creates the audio player, falling back to silence if audio is unavailable.
///
/// If audio initialization fails, a warning is logged and a
/// [`SilentPlayer`](super::SilentPlayer) is returned instead.
#[must_use]
pub fn try_create_player(library: Arc<NoiseLibrary>) -> Arc<dyn SoundPort> {
    match RodioNoisePlayer::new(library) {
        Ok(player) => Arc::new(player),
        Err(e) => {
            warn!("Audio not available, noise disabled: {} ({})", e, e.suggestion());
            Arc::new(super::SilentPlayer)
        }
    }
}
