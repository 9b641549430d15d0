//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    red: Style,
    dim: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a secondary detail line (dimmed, indented).
    pub(crate) fn detail(&self, msg: &str) {
        let line = format!("  {msg}");
        let _ = self.term.write_line(&self.dim.apply_to(line).to_string());
    }
}
