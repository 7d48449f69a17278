//! Display utilities for the LeanFocus CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Error messages
//! - Status display
//! - The noise library listing

use crate::sound::NoiseLibrary;
use crate::types::{IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message and the resulting timer line.
    pub fn show_result(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("{}", response.message);
        }
        if let Some(line) = response.data.as_ref().map(Self::timer_line) {
            println!("  {}", line);
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("LeanFocus status");
        println!("─────────────────────────────");

        match &response.data {
            Some(data) => println!("{}", Self::timer_line(data)),
            None => println!("The timer is not running"),
        }
    }

    /// Shows the noises found in a library.
    pub fn show_sounds(library: &NoiseLibrary) {
        for key in library.keys() {
            match library.path(key) {
                Some(path) => println!("{:<24} {}", key, path.display()),
                None => println!("{}", key),
            }
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// One-line summary such as "Paused (break next)  04:59".
    fn timer_line(data: &ResponseData) -> String {
        let state = data.state.as_deref().unwrap_or("unknown");
        let mut label = match state {
            "working" => "Working".to_string(),
            "on_break" => "On break".to_string(),
            "paused" => "Paused".to_string(),
            "stopped" => "Stopped".to_string(),
            other => other.to_string(),
        };
        if let Some(resume) = data.resume_state.as_deref() {
            let next = if resume == "on_break" { "break" } else { "work" };
            label.push_str(&format!(" ({} next)", next));
        }
        match data.display.as_deref() {
            Some(display) => format!("{:<22}{}", label, display),
            None => label,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn data(state: &str, resume_state: Option<&str>, display: &str) -> ResponseData {
        ResponseData {
            state: Some(state.to_string()),
            remaining_seconds: Some(0),
            resume_state: resume_state.map(str::to_string),
            display: Some(display.to_string()),
        }
    }

    // ------------------------------------------------------------------------
    // Timer Line Tests
    // ------------------------------------------------------------------------

    mod timer_line_tests {
        use super::*;

        #[test]
        fn test_working_line() {
            let line = Display::timer_line(&data("working", None, "24:59"));
            assert!(line.starts_with("Working"));
            assert!(line.ends_with("24:59"));
        }

        #[test]
        fn test_paused_line_names_next_phase() {
            let line = Display::timer_line(&data("paused", Some("on_break"), "04:59"));
            assert!(line.starts_with("Paused (break next)"));

            let line = Display::timer_line(&data("paused", Some("working"), "10:00"));
            assert!(line.starts_with("Paused (work next)"));
        }

        #[test]
        fn test_unknown_state_is_shown_verbatim() {
            let line = Display::timer_line(&ResponseData {
                state: Some("mystery".to_string()),
                ..ResponseData::default()
            });
            assert_eq!(line, "mystery");
        }
    }

    // ------------------------------------------------------------------------
    // Display Output Tests
    // ------------------------------------------------------------------------

    mod display_tests {
        use super::*;

        #[test]
        fn test_show_result() {
            // This test verifies the function doesn't panic
            let response =
                IpcResponse::success("Timer started", Some(data("working", None, "25:00")));
            Display::show_result(&response);
        }

        #[test]
        fn test_show_status_no_data() {
            Display::show_status(&IpcResponse::success("", None));
        }

        #[test]
        fn test_show_sounds() {
            let library = NoiseLibrary::from_entries([("Rain", "/sounds/rain.ogg")]);
            Display::show_sounds(&library);
        }

        #[test]
        fn test_show_error() {
            Display::show_error("Test error message");
        }
    }
}
