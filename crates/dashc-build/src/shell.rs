//! Shell line wrapping
//!
//! A generated line is `<python> -c '<program>'`. The program never holds a
//! single quote, so wrapping it needs no escaping; the interpreter name is
//! quoted only when it has to be.

use crate::error::{BuildError, Result};

/// Default interpreter for generated scripts.
pub const DEFAULT_SHEBANG: &str = "/usr/bin/env bash";

/// Default interpreter invoked by generated lines.
pub const DEFAULT_PYTHON: &str = "python";

/// Wrap `program` as `<python> -c '<program>'` and check it splits back.
pub fn wrap(python: &str, program: &str) -> Result<String> {
    if program.contains('\'') {
        return Err(BuildError::InvalidShellLine(
            "program text contains a single quote".to_string(),
        ));
    }
    let quoted = shlex::try_quote(python)
        .map_err(|e| BuildError::InvalidShellLine(format!("cannot quote '{}': {}", python, e)))?;
    let line = format!("{} -c '{}'", quoted, program);
    validate(&line, python, program)?;
    Ok(line)
}

/// A line must split into exactly `[python, "-c", program]`.
pub fn validate(line: &str, python: &str, program: &str) -> Result<()> {
    let (found_python, found_program) = split(line)?;
    if found_python != python || found_program != program {
        return Err(BuildError::InvalidShellLine(
            "line does not split back into the interpreter and program".to_string(),
        ));
    }
    Ok(())
}

/// Split a line into its interpreter and program.
pub fn split(line: &str) -> Result<(String, String)> {
    let words = shlex::split(line)
        .ok_or_else(|| BuildError::InvalidShellLine("unbalanced quoting".to_string()))?;
    match <[String; 3]>::try_from(words) {
        Ok([python, flag, program]) if flag == "-c" => Ok((python, program)),
        Ok(_) => Err(BuildError::InvalidShellLine(
            "expected '<python> -c <program>'".to_string(),
        )),
        Err(words) => Err(BuildError::InvalidShellLine(format!(
            "expected 3 words, found {}",
            words.len()
        ))),
    }
}

/// Executable script around `line`.
pub fn script(line: &str, shebang: &str) -> String {
    format!("#!{}\n{}\n", shebang, line)
}

/// The generated line inside a script or bare line: the last line that is
/// neither blank nor a comment.
pub fn find_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .last()
}
