//! Pre-flight syntax checks with the target interpreter

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{BuildError, Result};

/// Reads source from stdin and parses it under the name in `argv[1]`.
const PARSE_PROGRAM: &str = "import ast,sys;ast.parse(sys.stdin.buffer.read(),sys.argv[1])";

/// Parses source text with a real interpreter, when one is installed.
#[derive(Debug, Clone)]
pub struct SyntaxChecker {
    interpreter: Option<PathBuf>,
    name: String,
}

impl SyntaxChecker {
    /// Look up `python` on `PATH`. A missing interpreter disables checks.
    pub fn new(python: &str) -> Self {
        let interpreter = match which::which(python) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    python,
                    error = %e,
                    "interpreter not found; skipping syntax pre-flight"
                );
                None
            }
        };
        Self {
            interpreter,
            name: python.to_string(),
        }
    }

    /// A checker that never runs anything.
    pub fn disabled() -> Self {
        Self {
            interpreter: None,
            name: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interpreter.is_some()
    }

    /// Parse `source` as a module named `name`.
    pub fn check(&self, name: &str, source: &[u8]) -> Result<()> {
        let Some(interpreter) = &self.interpreter else {
            return Ok(());
        };

        let mut child = Command::new(interpreter)
            .arg("-c")
            .arg(PARSE_PROGRAM)
            .arg(name)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::io(interpreter, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source)
                .map_err(|e| BuildError::io(interpreter, e))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| BuildError::io(interpreter, e))?;

        if output.status.success() {
            tracing::debug!(name, python = %self.name, "syntax check passed");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("interpreter rejected the source")
            .trim()
            .to_string();
        Err(BuildError::InvalidSource {
            name: name.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_interpreter_skips() {
        let checker = SyntaxChecker::new("definitely-not-a-python-3f9a");
        assert!(!checker.is_enabled());
        assert!(checker.check("x.py", b"def (").is_ok());
    }

    #[test]
    fn test_real_interpreter() {
        let checker = SyntaxChecker::new("python3");
        if !checker.is_enabled() {
            return;
        }
        assert!(checker.check("ok.py", b"print('ok')\n").is_ok());
        match checker.check("bad.py", b"def (:\n") {
            Err(BuildError::InvalidSource { name, message }) => {
                assert_eq!(name, "bad.py");
                assert!(message.contains("SyntaxError"), "{}", message);
            }
            other => panic!("expected invalid source, got {:?}", other),
        }
    }
}
