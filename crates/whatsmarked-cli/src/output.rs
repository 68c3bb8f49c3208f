//! Terminal output.

use console::{Style, Term};

/// Rendered markup goes to stdout, diagnostics to stderr.
pub(crate) struct Output {
    stdout: Term,
    stderr: Term,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            stdout: Term::stdout(),
            stderr: Term::stderr(),
            red: Style::new().red(),
        }
    }

    /// Print rendered markup, ending it with a newline.
    pub(crate) fn markup(&self, html: &str) -> std::io::Result<()> {
        self.stdout
            .write_line(html.strip_suffix('\n').unwrap_or(html))
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.stderr.write_line(&self.red.apply_to(msg).to_string());
    }
}
