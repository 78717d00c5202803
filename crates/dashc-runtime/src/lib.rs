//! dashc runtime
//!
//! Everything a generated program needs once it is running: the payload
//! codec, the in-memory archive index, the virtual module resolver and the
//! entry-point dispatcher. Source execution is abstracted behind [`Host`].
//!
//! # Example
//!
//! ```ignore
//! use dashc_runtime::{Dispatcher, EntryPoint};
//!
//! let mut dispatcher = Dispatcher::from_payload(payload)?;
//! let status = dispatcher.dispatch(&"app:main".parse()?, &mut host, &mut std::io::stderr());
//! std::process::exit(status.code());
//! ```

#![warn(rust_2018_idioms)]

pub mod chain;
pub mod codec;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod importer;
pub mod index;
pub mod modpath;
pub mod module;
pub mod resolver;

pub use chain::{Finder, ModuleSpec, ResolutionChain};
pub use dispatch::{Dispatcher, ExitStatus};
pub use entry::{EntryParseError, EntryPoint};
pub use error::RuntimeError;
pub use importer::{Host, Importer};
pub use index::{ArchiveIndex, Classification};
pub use modpath::ModuleKind;
pub use module::{Module, Value};
pub use resolver::{DirectoryFinder, VirtualModuleResolver};
