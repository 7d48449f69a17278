//! Command definitions for the LeanFocus CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::Phase;

// ============================================================================
// CLI Structure
// ============================================================================

/// LeanFocus - a lightweight focus timer
#[derive(Parser, Debug)]
#[command(
    name = "leanfocus",
    version,
    about = "Lightweight focus timer with ambient noise",
    long_about = "A work/break focus timer with a floating overlay, a tray menu and \
                  looping ambient noise.\n\
                  Run the daemon with 'leanfocus run' and control it with the other commands.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (default: ~/.leanfocus/leanfocus.sock)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer daemon in the foreground
    Run(RunArgs),

    /// Start the timer, or resume it when paused
    Start,

    /// Pause the running timer
    Pause,

    /// Start or pause depending on the state
    Toggle,

    /// Stop the timer and reset it to the work phase
    Reset,

    /// Restart the current phase from its full duration, paused
    Restart,

    /// Show current timer status
    Status,

    /// Select the ambient noise for a phase
    Noise {
        /// Phase the noise plays in
        #[arg(value_enum)]
        kind: NoiseSlot,

        /// Noise name as listed by 'leanfocus sounds', or "None"
        key: String,
    },

    /// Set the playback volume
    Volume {
        /// Volume from 0.0 to 1.0
        #[arg(value_parser = parse_volume)]
        volume: f32,
    },

    /// Show or hide the floating overlay
    Overlay,

    /// Set the overlay font size and opacity
    Style {
        /// Font size in points (6-72)
        #[arg(long, value_parser = clap::value_parser!(u32).range(6..=72))]
        font_size: u32,

        /// Window opacity from 0.1 to 1.0
        #[arg(long, value_parser = parse_opacity)]
        opacity: f32,
    },

    /// List the noises found in the assets directory
    Sounds {
        /// Assets directory
        #[arg(long, default_value = "assets", value_name = "DIR")]
        assets: PathBuf,
    },

    /// Stop the daemon
    Quit,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Noise slot names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseSlot {
    /// Noise while working
    Work,
    /// Noise while on break
    Break,
}

impl From<NoiseSlot> for Phase {
    fn from(slot: NoiseSlot) -> Self {
        match slot {
            NoiseSlot::Work => Phase::Working,
            NoiseSlot::Break => Phase::OnBreak,
        }
    }
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Print the overlay to the terminal
    #[arg(short, long)]
    pub overlay: bool,

    /// Configuration file (default: <config dir>/leanfocus/config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Assets directory with sounds/ and CREDITS.txt
    #[arg(short, long, default_value = "assets", value_name = "DIR")]
    pub assets: PathBuf,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a volume between 0.0 and 1.0.
fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !(0.0..=1.0).contains(&volume) {
        return Err("Volume must be between 0.0 and 1.0".to_string());
    }
    Ok(volume)
}

/// Parses an overlay opacity between 0.1 and 1.0.
fn parse_opacity(s: &str) -> Result<f32, String> {
    let opacity: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !(0.1..=1.0).contains(&opacity) {
        return Err("Opacity must be between 0.1 and 1.0".to_string());
    }
    Ok(opacity)
}

// ============================================================================
// Tests
// ============================================================================
