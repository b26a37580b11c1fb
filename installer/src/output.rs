//! Output formatting for the modsync CLI.
//!
//! User-facing progress and summaries go to stderr through these helpers so
//! the library stays testable against an in-memory writer.

use std::fmt::Display;
use std::io::Write;

/// Write a line to stderr, ignoring write failures.
///
/// # Examples
///
/// ```
/// use modsync_installer::output::write_stderr_line;
///
/// let mut buffer = Vec::new();
/// write_stderr_line(&mut buffer, "hello");
/// assert_eq!(buffer, b"hello\n");
/// ```
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort; nowhere left to report to.
    }
}

/// Progress line printed before a record is processed.
#[must_use]
pub fn progress_line(index: usize, total: usize, display_name: &str) -> String {
    format!("[{index}/{total}] Installing {display_name}...")
}

/// Format the summary printed after a save run.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use modsync_installer::output::save_summary;
///
/// let line = save_summary(1, 0, Utf8Path::new("modules_profile.txt"));
/// assert_eq!(line, "Saved 1 module to modules_profile.txt");
/// ```
#[must_use]
pub fn save_summary(saved: usize, skipped: usize, output: &camino::Utf8Path) -> String {
    let noun = if saved == 1 { "module" } else { "modules" };
    if skipped == 0 {
        format!("Saved {saved} {noun} to {output}")
    } else {
        format!("Saved {saved} {noun} to {output} ({skipped} skipped)")
    }
}
