//! Colored terminal output.
//!
//! Uses `termcolor` for cross-platform colored terminal output.
//! Respects `NO_COLOR` environment variable and `--color` flag.
//! Reports go to stdout; status lines go to stderr so generated lines can
//! be piped.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled output writer for terminal.
pub struct StyledOutput {
    stdout: StandardStream,
    stderr: StandardStream,
}

impl StyledOutput {
    /// Create a new styled output with the given color choice.
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
            stderr: StandardStream::stderr(choice),
        }
    }

    fn styled(stream: &mut StandardStream, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = stream.set_color(&spec);
        let _ = write!(stream, "{}", text);
        let _ = stream.reset();
    }

    /// Raw text on stdout, exactly as given.
    pub fn raw(&mut self, text: &str) {
        let _ = write!(self.stdout, "{}", text);
        let _ = self.stdout.flush();
    }

    /// `label value` report row on stdout.
    pub fn field(&mut self, label: &str, value: &str) {
        Self::styled(&mut self.stdout, &format!("{:<10}", label), Some(Color::Cyan), true);
        let _ = writeln!(self.stdout, "{}", value);
    }

    /// Green status line on stderr.
    pub fn success(&mut self, text: &str) {
        Self::styled(&mut self.stderr, text, Some(Color::Green), true);
        let _ = writeln!(self.stderr);
    }

    /// Red error line on stderr.
    pub fn error(&mut self, text: &str) {
        Self::styled(&mut self.stderr, "error: ", Some(Color::Red), true);
        let _ = writeln!(self.stderr, "{}", text);
    }
}
