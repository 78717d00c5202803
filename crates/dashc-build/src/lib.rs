//! dashc build pipeline
//!
//! Packs a source file or directory into one `python -c '...'` line:
//!
//! 1. archive the directory ([`archive`])
//! 2. pick and verify the entry point ([`entrypoint`])
//! 3. render the bootstrap and embed it ([`bootstrap`], [`generate`])
//! 4. wrap it for the shell and check every layer ([`shell`], [`preflight`])
//!
//! [`inspect`] reads a generated line back.

#![warn(rust_2018_idioms)]

pub mod archive;
pub mod bootstrap;
pub mod config;
pub mod entrypoint;
pub mod error;
pub mod generate;
pub mod inspect;
pub mod literal;
pub mod preflight;
pub mod shell;

pub use archive::{Archive, ArchiveBuilder, ArchiveOptions, CompressionMethod};
pub use config::{BuildConfig, ConfigError, ConfigFile, Embed};
pub use entrypoint::Resolution;
pub use error::{BuildError, Result};
pub use generate::{generate, Contents, GenerateOptions, Generated};
pub use inspect::{inspect, Inspected, Report};
