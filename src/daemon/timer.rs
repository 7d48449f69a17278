//! Timer engine for LeanFocus.
//!
//! This module provides the core timer functionality:
//! - State transitions (Stopped → Working ⇄ OnBreak, Paused)
//! - A cancellable clock driver that recomputes the countdown from an
//!   absolute phase end every 100 ms
//! - Sound triggers bound to phase transitions
//! - Event firing for the tray and other observers
//!
//! # Locking
//!
//! The session sits behind a short-lived `std::sync::Mutex` that is never
//! held across an await or a sound call. Control operations additionally
//! serialize on the driver slot, an async mutex held while a driver run is
//! cancelled and joined. The driver task never takes the driver slot, so the
//! two cannot deadlock.
//!
//! Every phase sound goes through a third lock, the sound gate, which checks
//! that the phase is still running before playing. Boundary playback in the
//! driver and noise refreshes from control surfaces therefore cannot leave
//! the previous phase's noise looping. The gate is taken before the session
//! lock and never held across an await.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConfigPort;
use crate::sound::SoundPort;
use crate::types::{Phase, PhaseDurations, TimerSnapshot, TimerState};

/// Interval between clock driver wakes.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for the tray and other observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Started from Stopped
    Started,
    /// Resumed from Paused
    Resumed {
        /// Phase the timer resumed into
        phase: Phase,
    },
    /// A running phase reached its boundary
    PhaseChanged {
        /// Phase that ended
        from: Phase,
        /// Phase that started
        to: Phase,
    },
    /// Paused
    Paused {
        /// Phase to resume into
        resume_phase: Phase,
        /// Frozen countdown
        remaining_seconds: u32,
    },
    /// Refilled and paused
    Restarted {
        /// Phase to resume into
        resume_phase: Phase,
    },
    /// Stopped and reset
    Reset,
}

// ============================================================================
// Session
// ============================================================================

/// Mutable session data, guarded by the engine's session lock.
#[derive(Debug, Clone)]
struct Session {
    state: TimerState,
    resume_phase: Phase,
    remaining_seconds: u32,
    phase_end: Option<Instant>,
}

impl Session {
    fn new(durations: PhaseDurations) -> Self {
        Self {
            state: TimerState::Stopped,
            resume_phase: Phase::Working,
            remaining_seconds: durations.work_seconds,
            phase_end: None,
        }
    }

    /// Returns the countdown, derived from the phase end while running.
    fn remaining_at(&self, now: Instant) -> u32 {
        match (self.state.is_running(), self.phase_end) {
            (true, Some(end)) => remaining_until(end, now),
            _ => self.remaining_seconds,
        }
    }

    fn snapshot(&self, now: Instant) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            remaining_seconds: self.remaining_at(now),
            resume_phase: self.resume_phase,
        }
    }
}

/// Whole seconds until `end`, never negative.
///
/// Fractions above 0.1 s count as a full second, so a fresh 25 minute phase
/// reads 25:00 and the display shows 00:00 only in the final tenth.
pub fn remaining_until(end: Instant, now: Instant) -> u32 {
    let secs = end.saturating_duration_since(now).as_secs_f64();
    (secs + 0.9) as u32
}

// ============================================================================
// Driver bookkeeping
// ============================================================================

/// One active clock driver run.
struct DriverRun {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Counters describing driver run lifecycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Runs spawned
    pub spawned: usize,
    /// Runs joined by a control operation
    pub joined: usize,
    /// Runs whose loop is currently executing
    pub live: usize,
    /// Highest number of loops ever executing at once
    pub peak_live: usize,
}

impl DriverStats {
    /// Runs spawned and not yet joined.
    pub fn in_flight(&self) -> usize {
        self.spawned.saturating_sub(self.joined)
    }
}

#[derive(Debug, Default)]
struct DriverCounters {
    spawned: AtomicUsize,
    joined: AtomicUsize,
    live: AtomicUsize,
    peak_live: AtomicUsize,
}

/// Outcome of one driver wake.
enum Tick {
    Continue,
    Boundary { from: Phase, to: Phase },
    Exit,
}

// ============================================================================
// EngineInner
// ============================================================================

/// State shared between the engine handle and its driver task.
struct EngineInner {
    session: Mutex<Session>,
    sound_gate: Mutex<()>,
    durations: PhaseDurations,
    config: Arc<dyn ConfigPort>,
    sound: Arc<dyn SoundPort>,
    events: Option<mpsc::UnboundedSender<TimerEvent>>,
    counters: DriverCounters,
}

impl EngineInner {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn duration_of(&self, phase: Phase) -> u32 {
        self.durations.for_phase(phase).max(1)
    }

    /// Plays the noise configured for `phase` if `phase` is running.
    ///
    /// Stops the current noise first. Playback failures are logged; the phase
    /// runs silently.
    fn play_if_running(&self, phase: Phase) -> bool {
        let _gate = self.sound_gate.lock().unwrap_or_else(PoisonError::into_inner);
        if self.lock().state.phase() != Some(phase) {
            return false;
        }

        let key = self.config.noise_for(phase);
        let volume = self.config.volume();
        self.sound.stop();
        if let Err(e) = self.sound.play(&key, volume) {
            warn!(
                "Failed to play {} noise '{}': {} ({})",
                phase.noise_slot(),
                key,
                e,
                e.suggestion()
            );
        }
        true
    }

    fn emit(&self, event: TimerEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                debug!("No timer event receiver for {:?}", event);
            }
        }
    }

    /// Advances the session by one driver wake.
    fn tick(&self, now: Instant) -> Tick {
        let mut session = self.lock();
        let (phase, end) = match (session.state.phase(), session.phase_end) {
            (Some(phase), Some(end)) => (phase, end),
            _ => return Tick::Exit,
        };

        if end > now {
            session.remaining_seconds = remaining_until(end, now);
            return Tick::Continue;
        }

        let next = phase.next();
        let duration = self.duration_of(next);
        session.state = next.into();
        session.remaining_seconds = duration;
        session.phase_end = Some(now + Duration::from_secs(u64::from(duration)));
        Tick::Boundary {
            from: phase,
            to: next,
        }
    }
}

/// Clock driver loop.
///
/// Wakes every [`TICK_INTERVAL`] from `first_wake` on, exits on cancellation
/// or when the session is no longer running. The schedule is fixed when the
/// run is spawned, not when the task is first polled, so a wake that is
/// already due fires on the first poll.
async fn drive(inner: Arc<EngineInner>, cancel: CancellationToken, first_wake: Instant) {
    let live = inner.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
    inner.counters.peak_live.fetch_max(live, Ordering::SeqCst);
    debug!("Clock driver started");

    let mut ticker = interval_at(first_wake, TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match inner.tick(Instant::now()) {
            Tick::Continue => {}
            Tick::Boundary { from, to } => {
                info!("Phase boundary: {} -> {}", from.as_str(), to.as_str());
                if !inner.play_if_running(to) {
                    debug!("Skipping {} noise, phase already left", to.as_str());
                }
                inner.emit(TimerEvent::PhaseChanged { from, to });
            }
            Tick::Exit => break,
        }
    }

    inner.counters.live.fetch_sub(1, Ordering::SeqCst);
    debug!("Clock driver stopped");
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the focus session and its clock driver.
///
/// All operations take `&self` and may be called from any task. Operations
/// that do not apply to the current state are no-ops and return `false`.
pub struct TimerEngine {
    inner: Arc<EngineInner>,
    driver: tokio::sync::Mutex<Option<DriverRun>>,
}

impl TimerEngine {
    /// Creates a stopped engine.
    ///
    /// Phase durations are read from `config` once, here. Noise selection
    /// and volume are read each time a phase sound is triggered.
    pub fn new(config: Arc<dyn ConfigPort>, sound: Arc<dyn SoundPort>) -> Self {
        Self::build(config, sound, None)
    }

    /// Creates a stopped engine that reports transitions on `events`.
    pub fn with_events(
        config: Arc<dyn ConfigPort>,
        sound: Arc<dyn SoundPort>,
        events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self::build(config, sound, Some(events))
    }

    fn build(
        config: Arc<dyn ConfigPort>,
        sound: Arc<dyn SoundPort>,
        events: Option<mpsc::UnboundedSender<TimerEvent>>,
    ) -> Self {
        let durations = config.durations();
        Self {
            inner: Arc::new(EngineInner {
                session: Mutex::new(Session::new(durations)),
                sound_gate: Mutex::new(()),
                durations,
                config,
                sound,
                events,
                counters: DriverCounters::default(),
            }),
            driver: tokio::sync::Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------------
    // Control operations
    // ------------------------------------------------------------------------

    /// Starts from Stopped or resumes from Paused.
    pub async fn start(&self) -> bool {
        let mut driver = self.driver.lock().await;
        self.start_locked(&mut driver).await.is_some()
    }

    /// Pauses a running phase and waits for the driver to exit.
    pub async fn pause(&self) -> bool {
        let mut driver = self.driver.lock().await;
        self.pause_locked(&mut driver).await.is_some()
    }

    /// Pauses if running, otherwise starts.
    ///
    /// The decision is made under the driver slot, so concurrent toggles
    /// alternate. Returns the event describing what happened.
    pub async fn toggle(&self) -> Option<TimerEvent> {
        let mut driver = self.driver.lock().await;
        if self.state().is_running() {
            self.pause_locked(&mut driver).await
        } else {
            self.start_locked(&mut driver).await
        }
    }

    /// Stops the timer and resets the countdown to the full work duration.
    ///
    /// Returns `false` if the timer was already stopped.
    pub async fn reset(&self) -> bool {
        let mut driver = self.driver.lock().await;
        let was = {
            let mut session = self.inner.lock();
            let was = session.state;
            session.state = TimerState::Stopped;
            session.resume_phase = Phase::Working;
            session.remaining_seconds = self.inner.durations.work_seconds;
            session.phase_end = None;
            was
        };

        self.join_driver(&mut driver).await;
        self.inner.sound.stop();

        if was == TimerState::Stopped {
            return false;
        }
        info!("Timer reset from {}", was.as_str());
        self.inner.emit(TimerEvent::Reset);
        true
    }

    /// Refills the resume phase to its full duration and pauses.
    ///
    /// No-op while stopped.
    pub async fn restart_and_pause(&self) -> bool {
        let mut driver = self.driver.lock().await;
        let resume_phase = {
            let mut session = self.inner.lock();
            if session.state == TimerState::Stopped {
                return false;
            }
            if let Some(phase) = session.state.phase() {
                session.resume_phase = phase;
            }
            session.state = TimerState::Paused;
            session.remaining_seconds = self.inner.duration_of(session.resume_phase);
            session.phase_end = None;
            session.resume_phase
        };

        self.join_driver(&mut driver).await;
        self.inner.sound.stop();

        info!("Timer restarted, paused into {}", resume_phase.as_str());
        self.inner.emit(TimerEvent::Restarted { resume_phase });
        true
    }

    /// Replays the current phase's noise if `phase` is the running phase.
    ///
    /// Called after the noise selection for `phase` changed.
    pub async fn refresh_sound(&self, phase: Phase) -> bool {
        let _driver = self.driver.lock().await;
        self.inner.play_if_running(phase)
    }

    /// Cancels the driver and silences playback, leaving the state as is.
    ///
    /// Used at process exit.
    pub async fn shutdown(&self) {
        let mut driver = self.driver.lock().await;
        self.join_driver(&mut driver).await;
        self.inner.sound.stop();
        debug!("Timer engine shut down");
    }

    async fn start_locked(&self, driver: &mut Option<DriverRun>) -> Option<TimerEvent> {
        let (phase, event) = {
            let mut session = self.inner.lock();
            let (phase, event) = match session.state {
                TimerState::Working | TimerState::OnBreak => return None,
                TimerState::Stopped => {
                    session.remaining_seconds = self.inner.durations.work_seconds;
                    (Phase::Working, TimerEvent::Started)
                }
                TimerState::Paused => {
                    let phase = session.resume_phase;
                    (phase, TimerEvent::Resumed { phase })
                }
            };
            session.state = phase.into();
            session.phase_end = Some(
                Instant::now() + Duration::from_secs(u64::from(session.remaining_seconds)),
            );
            (phase, event)
        };

        // Every control path joins its run, so this only reaps a run that
        // already finished on its own.
        self.join_driver(driver).await;

        self.inner.play_if_running(phase);
        *driver = Some(self.spawn_driver());

        info!("Timer running: {}", phase.as_str());
        self.inner.emit(event);
        Some(event)
    }

    async fn pause_locked(&self, driver: &mut Option<DriverRun>) -> Option<TimerEvent> {
        let (resume_phase, remaining_seconds) = {
            let mut session = self.inner.lock();
            let Some(phase) = session.state.phase() else {
                return None;
            };
            session.remaining_seconds = session.remaining_at(Instant::now());
            session.resume_phase = phase;
            session.state = TimerState::Paused;
            session.phase_end = None;
            (phase, session.remaining_seconds)
        };

        self.join_driver(driver).await;
        self.inner.sound.stop();

        info!(
            "Timer paused with {}s left in {}",
            remaining_seconds,
            resume_phase.as_str()
        );
        let event = TimerEvent::Paused {
            resume_phase,
            remaining_seconds,
        };
        self.inner.emit(event);
        Some(event)
    }

    fn spawn_driver(&self) -> DriverRun {
        let cancel = CancellationToken::new();
        let first_wake = Instant::now() + TICK_INTERVAL;
        let handle = tokio::spawn(drive(Arc::clone(&self.inner), cancel.clone(), first_wake));
        self.inner.counters.spawned.fetch_add(1, Ordering::SeqCst);
        DriverRun { cancel, handle }
    }

    /// Cancels the active run, if any, and waits until it has exited.
    async fn join_driver(&self, driver: &mut Option<DriverRun>) {
        let Some(run) = driver.take() else {
            return;
        };
        run.cancel.cancel();
        if let Err(e) = run.handle.await {
            warn!("Clock driver task failed: {}", e);
        }
        self.inner.counters.joined.fetch_add(1, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    /// Returns state, countdown and resume phase from one lock acquisition.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.inner.lock().snapshot(Instant::now())
    }

    /// Returns the current state.
    pub fn state(&self) -> TimerState {
        self.inner.lock().state
    }

    /// Returns the seconds left in the current phase.
    pub fn remaining_seconds(&self) -> u32 {
        self.inner.lock().remaining_at(Instant::now())
    }

    /// Returns the phase a paused timer resumes into.
    pub fn resume_phase(&self) -> Phase {
        self.inner.lock().resume_phase
    }

    /// Returns the phase durations captured at construction.
    pub fn durations(&self) -> PhaseDurations {
        self.inner.durations
    }

    /// Returns driver lifecycle counters.
    pub fn driver_stats(&self) -> DriverStats {
        let c = &self.inner.counters;
        DriverStats {
            spawned: c.spawned.load(Ordering::SeqCst),
            joined: c.joined.load(Ordering::SeqCst),
            live: c.live.load(Ordering::SeqCst),
            peak_live: c.peak_live.load(Ordering::SeqCst),
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        if let Some(run) = self.driver.get_mut().take() {
            run.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("snapshot", &self.snapshot())
            .field("durations", &self.inner.durations)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
