//! Program generation
//!
//! Turns a source file or directory into a validated `<python> -c '...'`
//! line. Nothing is returned unless the line splits back into the exact
//! program and, when an interpreter is available, every layer parses.

use std::path::{Path, PathBuf};

use dashc_runtime::{codec, ArchiveIndex, EntryPoint, ExitStatus, VirtualModuleResolver};

use crate::archive::{ArchiveBuilder, ArchiveOptions, CompressionMethod};
use crate::bootstrap;
use crate::config::{BuildConfig, Embed};
use crate::entrypoint::{self, Resolution};
use crate::error::{BuildError, Result};
use crate::literal;
use crate::preflight::SyntaxChecker;
use crate::shell;

/// Everything that shapes a generated line.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Explicit entry point for directory sources
    pub entrypoint: Option<String>,
    pub archive: ArchiveOptions,
    pub embed: Embed,
    /// Interpreter named in the generated line
    pub python: String,
    /// Run syntax pre-flight checks when the interpreter is installed
    pub check: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            entrypoint: None,
            archive: ArchiveOptions::default(),
            embed: Embed::default(),
            python: shell::DEFAULT_PYTHON.to_string(),
            check: true,
        }
    }
}

impl GenerateOptions {
    /// Options from a `[build]` section, defaults for anything unset.
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        let mut options = Self::default();
        options.entrypoint = config.entrypoint.clone();
        if let Some(method) = &config.compression {
            options.archive.method = method.parse::<CompressionMethod>()?;
        }
        options.archive.level = config.level;
        if let Some(exclude) = &config.exclude {
            options.archive.exclude = exclude.clone();
        }
        if let Some(embed) = config.embed {
            options.embed = embed;
        }
        if let Some(python) = &config.python {
            options.python = python.clone();
        }
        if let Some(check) = config.check {
            options.check = check;
        }
        Ok(options)
    }
}

/// What was embedded.
#[derive(Debug, Clone, PartialEq)]
pub enum Contents {
    /// A single source file, run under its file name
    SingleFile { name: String },
    /// An archived directory and its entry point
    Directory {
        resolution: Resolution,
        files: Vec<String>,
        archive_size: usize,
    },
}

/// A validated line and how it was built.
#[derive(Debug, Clone)]
pub struct Generated {
    /// `<python> -c '<program>'`
    pub line: String,
    /// The `-c` argument
    pub program: String,
    pub contents: Contents,
    pub embed: Embed,
}

impl Generated {
    /// The line as an executable script.
    pub fn script(&self, shebang: &str) -> String {
        shell::script(&self.line, shebang)
    }

    pub fn entry(&self) -> Option<&EntryPoint> {
        match &self.contents {
            Contents::Directory { resolution, .. } => Some(&resolution.entry),
            Contents::SingleFile { .. } => None,
        }
    }
}

/// Generate a line for `source`, a file or a directory.
pub fn generate(source: &Path, options: &GenerateOptions) -> Result<Generated> {
    let metadata = std::fs::metadata(source).map_err(|e| BuildError::io(source, e))?;
    let checker = if options.check {
        SyntaxChecker::new(&options.python)
    } else {
        SyntaxChecker::disabled()
    };

    let (name, inner, contents) = if metadata.is_dir() {
        directory_program(source, options, &checker)?
    } else {
        file_program(source, options, &checker)?
    };

    let program = embed(&inner, &name, options.embed)?;
    checker.check("<program>", program.as_bytes())?;
    let line = shell::wrap(&options.python, &program)?;

    tracing::info!(
        source = %source.display(),
        embed = ?options.embed,
        length = line.len(),
        "generated line"
    );
    Ok(Generated {
        line,
        program,
        contents,
        embed: options.embed,
    })
}

fn file_program(
    source: &Path,
    options: &GenerateOptions,
    checker: &SyntaxChecker,
) -> Result<(String, Vec<u8>, Contents)> {
    if let Some(entry) = &options.entrypoint {
        tracing::warn!(entry = %entry, "entry point is ignored for single-file sources");
    }
    let bytes = std::fs::read(source).map_err(|e| BuildError::io(source, e))?;
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    checker.check(&name, &bytes)?;
    Ok((name.clone(), bytes, Contents::SingleFile { name }))
}

fn directory_program(
    source: &Path,
    options: &GenerateOptions,
    checker: &SyntaxChecker,
) -> Result<(String, Vec<u8>, Contents)> {
    let archive = ArchiveBuilder::new(source, &options.archive)?.build()?;
    let resolver = VirtualModuleResolver::new(ArchiveIndex::from_zip_bytes(&archive.bytes)?);
    let resolution = entrypoint::resolve(options.entrypoint.as_deref(), &resolver)?;

    let payload = codec::encode(&archive.bytes).map_err(BuildError::Encode)?;
    let program = bootstrap::render(&payload, &resolution.entry);
    checker.check(bootstrap::BOOTSTRAP_NAME, program.as_bytes())?;

    let contents = Contents::Directory {
        resolution,
        files: archive.paths,
        archive_size: archive.bytes.len(),
    };
    Ok((bootstrap::BOOTSTRAP_NAME.to_string(), program.into_bytes(), contents))
}

/// Compressed program text up to the payload.
///
/// A decode failure reaches the temporary exception hook, which reports
/// it and exits with the data-corruption status. The default hook is
/// back in place before the embedded program runs.
pub(crate) fn compressed_head() -> String {
    format!(
        "import base64,os,sys,zlib;\
         sys.excepthook=lambda t,e,b:(sys.stderr.write(\"Data corruption: %s\\n\"%(e,)),sys.stderr.flush(),os._exit({}));\
         _dashc=zlib.decompress(base64.b64decode(\"",
        ExitStatus::DATA_CORRUPTION.code()
    )
}

/// Compressed program text between the payload and the filename literal.
pub(crate) const COMPRESSED_TAIL: &str =
    "\",validate=True));sys.excepthook=sys.__excepthook__;exec(compile(_dashc,";

/// Embed program text as the `-c` argument.
pub fn embed(source: &[u8], name: &str, mode: Embed) -> Result<String> {
    match mode {
        Embed::Compressed => {
            let payload = codec::encode(source).map_err(BuildError::Encode)?;
            Ok(format!(
                "{}{}{}{},\"exec\"))",
                compressed_head(),
                payload,
                COMPRESSED_TAIL,
                literal::quote(name)
            ))
        }
        Embed::Plain => {
            let text = std::str::from_utf8(source).map_err(|e| BuildError::InvalidSource {
                name: name.to_string(),
                message: format!("plain embedding needs UTF-8 source: {}", e),
            })?;
            Ok(format!(
                "exec(compile({},{},\"exec\"))",
                literal::quote(text),
                literal::quote(name)
            ))
        }
    }
}

/// Default output path for a script built from `source`.
pub fn default_script_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());
    PathBuf::from(format!("{}.sh", stem))
}
