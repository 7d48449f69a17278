//! Floating timer overlay.
//!
//! The overlay is an observer: every [`POLL_INTERVAL`] it renders an engine
//! snapshot into an [`OverlayFrame`] and hands it to an [`OverlaySink`] if the
//! frame changed. Window toolkits plug in as sinks; the daemon ships a
//! terminal sink for headless use.
//!
//! Sinks that take pointer input report it as [`PointerEvent`]s. The poller
//! runs them through a [`ClickTracker`], which tells a click (toggle the
//! timer) from a drag (remember the window position), and hands the
//! resulting gestures to the daemon.

use std::io::Write;
use std::time::{Duration, Instant};

use crate::config::FocusConfig;
use crate::types::{Phase, TimerSnapshot, TimerState};

/// Interval between overlay redraw polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Longest press that still counts as a click.
pub const CLICK_MAX_DURATION: Duration = Duration::from_millis(300);

/// Squared pointer travel below which a press counts as a click (5 px).
pub const CLICK_MAX_DISTANCE_SQ: i64 = 25;

// ============================================================================
// OverlayFrame
// ============================================================================

/// Text and colour of the overlay for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayFrame {
    /// State label, e.g. `WORK` or `PAUSE (BREAK)`
    pub label: String,
    /// Countdown, or `--:--` while stopped
    pub time: String,
    /// Foreground colour as `#RRGGBB`
    pub color: &'static str,
}

impl OverlayFrame {
    /// Renders a snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        let (label, color) = match snapshot.state {
            TimerState::Working => ("WORK".to_string(), "#9E9E9E"),
            TimerState::OnBreak => ("BREAK".to_string(), "#80CBC4"),
            TimerState::Paused => {
                let into = match snapshot.resume_phase {
                    Phase::Working => "WORK",
                    Phase::OnBreak => "BREAK",
                };
                (format!("PAUSE ({})", into), "#FFF59D")
            }
            TimerState::Stopped => ("STOP".to_string(), "#FF8A80"),
        };
        Self {
            label,
            time: snapshot.clock_text(),
            color,
        }
    }

    /// Full overlay text.
    pub fn text(&self) -> String {
        format!("{}   {}", self.label, self.time)
    }
}

// ============================================================================
// ClickTracker
// ============================================================================

/// Pointer input reported by an overlay sink, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// Button pressed
    Press {
        /// When the press happened
        at: Instant,
        /// Pointer position
        position: (i32, i32),
    },
    /// Button released
    Release {
        /// When the release happened
        at: Instant,
        /// Pointer position
        position: (i32, i32),
        /// Top-left corner of the overlay window after the release
        window: (i32, i32),
    },
}

/// What a press/release pair on the overlay meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Short press without movement
    Click,
    /// Anything else
    Drag,
}

/// Classifies pointer presses on the overlay.
#[derive(Debug, Default)]
pub struct ClickTracker {
    press: Option<(Instant, (i32, i32))>,
}

impl ClickTracker {
    /// Creates a tracker with no press in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a press at a screen position.
    pub fn press(&mut self, at: Instant, position: (i32, i32)) {
        self.press = Some((at, position));
    }

    /// Classifies the release. Returns `None` without a matching press.
    pub fn release(&mut self, at: Instant, position: (i32, i32)) -> Option<Gesture> {
        let (pressed_at, start) = self.press.take()?;
        let held = at.saturating_duration_since(pressed_at);
        let dx = i64::from(position.0 - start.0);
        let dy = i64::from(position.1 - start.1);

        if held < CLICK_MAX_DURATION && dx * dx + dy * dy < CLICK_MAX_DISTANCE_SQ {
            Some(Gesture::Click)
        } else {
            Some(Gesture::Drag)
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Something that can display the overlay.
pub trait OverlaySink: Send {
    /// Draws a changed frame.
    fn draw(&mut self, frame: &OverlayFrame);

    /// Shows or hides the overlay.
    fn set_visible(&mut self, visible: bool);

    /// Drains pointer input received since the last call.
    ///
    /// Sinks without pointer input keep the default.
    fn take_pointer_events(&mut self) -> Vec<PointerEvent> {
        Vec::new()
    }
}

/// Draws the overlay as a single, continuously rewritten terminal line.
#[derive(Debug)]
pub struct TerminalOverlay<W: Write + Send> {
    out: W,
    visible: bool,
}

impl TerminalOverlay<std::io::Stdout> {
    /// Creates a sink writing to stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalOverlay<W> {
    /// Creates a sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            visible: false,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        // \x1b[2K clears the previous, possibly longer, frame.
        let result = write!(self.out, "\r\x1b[2K{}", line).and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::debug!("Failed to draw overlay: {}", e);
        }
    }
}

impl<W: Write + Send> OverlaySink for TerminalOverlay<W> {
    fn draw(&mut self, frame: &OverlayFrame) {
        if self.visible {
            self.write_line(&frame.text());
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.write_line("");
        }
    }
}

// ============================================================================
// OverlayPoller
// ============================================================================

/// Redraws the overlay sink when the frame or visibility changes, and turns
/// its pointer input into gestures.
pub struct OverlayPoller {
    sink: Box<dyn OverlaySink>,
    clicks: ClickTracker,
    last_frame: Option<OverlayFrame>,
    visible: Option<bool>,
}

impl OverlayPoller {
    /// Creates a poller drawing into `sink`.
    pub fn new(sink: Box<dyn OverlaySink>) -> Self {
        Self {
            sink,
            clicks: ClickTracker::new(),
            last_frame: None,
            visible: None,
        }
    }

    /// Renders one poll. Returns true if the sink was drawn to.
    pub fn poll(&mut self, snapshot: &TimerSnapshot, config: &FocusConfig) -> bool {
        let mut drawn = false;

        if self.visible != Some(config.show_timer) {
            self.sink.set_visible(config.show_timer);
            self.visible = Some(config.show_timer);
            // Force a redraw of the current frame after showing.
            self.last_frame = None;
        }

        let frame = OverlayFrame::from_snapshot(snapshot);
        if self.last_frame.as_ref() != Some(&frame) {
            if config.show_timer {
                self.sink.draw(&frame);
                drawn = true;
            }
            self.last_frame = Some(frame);
        }
        drawn
    }

    /// Classifies the sink's pending pointer input.
    ///
    /// Each gesture comes with the window position after the release.
    pub fn take_gestures(&mut self) -> Vec<(Gesture, (i32, i32))> {
        let mut gestures = Vec::new();
        for event in self.sink.take_pointer_events() {
            match event {
                PointerEvent::Press { at, position } => self.clicks.press(at, position),
                PointerEvent::Release {
                    at,
                    position,
                    window,
                } => {
                    if let Some(gesture) = self.clicks.release(at, position) {
                        gestures.push((gesture, window));
                    }
                }
            }
        }
        gestures
    }

    /// Returns the last rendered frame.
    pub fn last_frame(&self) -> Option<&OverlayFrame> {
        self.last_frame.as_ref()
    }
}

impl std::fmt::Debug for OverlayPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayPoller")
            .field("last_frame", &self.last_frame)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
