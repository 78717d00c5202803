//! Reading generated lines back
//!
//! Undoes the shell wrapping and the embedding, then, for archived
//! directories, decodes the payload and reports what the resolver will see.

use dashc_runtime::{codec, ArchiveIndex, Classification, EntryPoint, RuntimeError};

use crate::bootstrap::{self, ENTRY_ASSIGNMENT, PAYLOAD_ASSIGNMENT};
use crate::config::Embed;
use crate::error::Result;
use crate::generate::{compressed_head, COMPRESSED_TAIL};
use crate::literal;
use crate::shell;

const PLAIN_PREFIX: &str = "exec(compile(";

/// What a generated line runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Inspected {
    SingleFile {
        name: String,
        source: Vec<u8>,
    },
    Directory {
        entry: EntryPoint,
        /// Encoded archive, as embedded
        payload: String,
        packages: Vec<String>,
        modules: Vec<String>,
        files: Vec<String>,
        archive_size: usize,
    },
}

/// Everything `inspect` could learn from a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub python: String,
    pub embed: Embed,
    pub program_len: usize,
    pub contents: Inspected,
}

fn corrupt(message: impl Into<String>) -> RuntimeError {
    RuntimeError::DataCorruption(message.into())
}

/// Inspect a generated line or script.
pub fn inspect(text: &str) -> Result<Report> {
    let line = shell::find_line(text).ok_or_else(|| corrupt("no generated line found"))?;
    let (python, program) = shell::split(line)?;
    let (embed, name, inner) = unembed(&program)?;

    let contents = if name == bootstrap::BOOTSTRAP_NAME {
        let bootstrap = String::from_utf8(inner)
            .map_err(|_| corrupt("bootstrap is not valid UTF-8"))?;
        inspect_bootstrap(&bootstrap)?
    } else {
        Inspected::SingleFile {
            name,
            source: inner,
        }
    };

    Ok(Report {
        python,
        embed,
        program_len: program.len(),
        contents,
    })
}

/// Recover (mode, virtual filename, program text) from a `-c` argument.
fn unembed(program: &str) -> std::result::Result<(Embed, String, Vec<u8>), RuntimeError> {
    if let Some(rest) = program.strip_prefix(compressed_head().as_str()) {
        let (payload, rest) = rest
            .split_once(COMPRESSED_TAIL)
            .ok_or_else(|| corrupt("unterminated payload"))?;
        let (name, rest) = literal::parse_prefix(rest).ok_or_else(|| corrupt("bad filename literal"))?;
        expect_exec_tail(rest)?;
        return Ok((Embed::Compressed, name, codec::decode(payload)?));
    }

    if let Some(rest) = program.strip_prefix(PLAIN_PREFIX) {
        let (source, rest) = literal::parse_prefix(rest).ok_or_else(|| corrupt("bad source literal"))?;
        let rest = rest
            .strip_prefix(',')
            .ok_or_else(|| corrupt("missing virtual filename"))?;
        let (name, rest) = literal::parse_prefix(rest).ok_or_else(|| corrupt("bad filename literal"))?;
        expect_exec_tail(rest)?;
        return Ok((Embed::Plain, name, source.into_bytes()));
    }

    Err(corrupt("not a dashc program"))
}

fn expect_exec_tail(rest: &str) -> std::result::Result<(), RuntimeError> {
    if rest == ",\"exec\"))" {
        Ok(())
    } else {
        Err(corrupt("unexpected text after the program"))
    }
}

fn assignment<'a>(bootstrap: &'a str, prefix: &str) -> std::result::Result<&'a str, RuntimeError> {
    bootstrap
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .ok_or_else(|| corrupt(format!("bootstrap has no '{}' line", prefix.trim_end())))
}

fn inspect_bootstrap(bootstrap: &str) -> std::result::Result<Inspected, RuntimeError> {
    let (payload, _) = literal::parse_prefix(assignment(bootstrap, PAYLOAD_ASSIGNMENT)?)
        .ok_or_else(|| corrupt("bad payload literal"))?;
    let entry = bootstrap::parse_entry_tuple(assignment(bootstrap, ENTRY_ASSIGNMENT)?)
        .ok_or_else(|| corrupt("bad entry point"))?;

    let archive = codec::decode(&payload)?;
    let index = ArchiveIndex::from_zip_bytes(&archive)?;
    let classification = Classification::from_index(&index);

    Ok(Inspected::Directory {
        entry,
        payload,
        packages: classification.packages().map(String::from).collect(),
        modules: classification.modules().map(String::from).collect(),
        files: index.paths().map(String::from).collect(),
        archive_size: archive.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::generate::embed;

    #[test]
    fn test_inspect_single_file_both_modes() {
        for mode in [Embed::Compressed, Embed::Plain] {
            let program = embed(b"print('hi')\n", "hi.py", mode).unwrap();
            let line = shell::wrap("python3", &program).unwrap();
            let report = inspect(&line).unwrap();
            assert_eq!(report.python, "python3");
            assert_eq!(report.embed, mode);
            assert_eq!(
                report.contents,
                Inspected::SingleFile {
                    name: "hi.py".into(),
                    source: b"print('hi')\n".to_vec()
                }
            );
        }
    }

    #[test]
    fn test_inspect_rejects_foreign_lines() {
        assert!(matches!(
            inspect("python -c 'print(1)'"),
            Err(BuildError::Runtime(RuntimeError::DataCorruption(_)))
        ));
        assert!(matches!(inspect("ls -la"), Err(BuildError::InvalidShellLine(_))));
        assert!(inspect("").is_err());
    }

    #[test]
    fn test_inspect_truncated_payload() {
        let program = embed(b"print('hi')\n", "hi.py", Embed::Compressed).unwrap();
        let damaged = program.replacen("base64.b64decode(\"", "base64.b64decode(\"A", 1);
        let line = shell::wrap("python", &damaged).unwrap();
        assert!(matches!(
            inspect(&line),
            Err(BuildError::Runtime(RuntimeError::DataCorruption(_)))
        ));
    }
}
