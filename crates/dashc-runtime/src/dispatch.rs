//! Entry-point dispatch
//!
//! Installs the archive resolver at the front of a fresh chain and runs the
//! embedded entry point, translating every outcome into a process exit
//! status:
//!
//! | outcome                                   | status |
//! |-------------------------------------------|--------|
//! | clean run, function returned non-integer  | 0      |
//! | function returned integer `n`             | `n`    |
//! | missing target, uncaught error            | 1      |
//! | payload does not decode                   | 65     |
//! | classified entry missing from the archive | 70     |

use std::fmt;
use std::io::Write;

use crate::chain::ResolutionChain;
use crate::entry::EntryPoint;
use crate::error::RuntimeError;
use crate::importer::{Host, Importer};
use crate::index::ArchiveIndex;
use crate::modpath::{self, MAIN_MODULE};
use crate::module::Value;
use crate::resolver::VirtualModuleResolver;

/// Process exit status produced by a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitStatus(i32);

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus(0);
    pub const FAILURE: ExitStatus = ExitStatus(1);
    /// Payload failed to decode or decompress (`EX_DATAERR`)
    pub const DATA_CORRUPTION: ExitStatus = ExitStatus(65);
    /// Resolver found a classified name with no archive entry (`EX_SOFTWARE`)
    pub const RESOLVER_INCONSISTENCY: ExitStatus = ExitStatus(70);

    /// Status for an integer returned by an entry function.
    ///
    /// Like a process exit, only the low byte survives.
    pub fn from_code(code: i64) -> Self {
        ExitStatus((code & 0xff) as i32)
    }

    /// Status for the value an entry function returned.
    pub fn from_return(value: &Value) -> Self {
        value
            .as_exit_code()
            .map(Self::from_code)
            .unwrap_or(Self::SUCCESS)
    }

    /// Status for an error that escaped the entry point.
    pub fn for_error(err: &RuntimeError) -> Self {
        match err {
            RuntimeError::DataCorruption(_) => Self::DATA_CORRUPTION,
            RuntimeError::ResolverInconsistency { .. } => Self::RESOLVER_INCONSISTENCY,
            _ => Self::FAILURE,
        }
    }

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit status {}", self.0)
    }
}

/// Runs an entry point against an owned resolution chain.
#[derive(Debug)]
pub struct Dispatcher {
    importer: Importer,
}

impl Dispatcher {
    /// Decode a payload and install its archive resolver.
    pub fn from_payload(payload: &str) -> Result<Self, RuntimeError> {
        Ok(Self::from_index(ArchiveIndex::from_payload(payload)?))
    }

    /// Install an archive resolver for an already decoded index.
    pub fn from_index(index: ArchiveIndex) -> Self {
        let mut chain = ResolutionChain::new();
        chain.install(Box::new(VirtualModuleResolver::new(index)));
        Self::with_chain(chain)
    }

    /// Use a caller-built chain as is.
    pub fn with_chain(chain: ResolutionChain) -> Self {
        Self {
            importer: Importer::new(chain),
        }
    }

    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    /// Run `entry` on `host`, writing diagnostics to `stderr`.
    pub fn dispatch(
        &mut self,
        entry: &EntryPoint,
        host: &mut dyn Host,
        stderr: &mut dyn Write,
    ) -> ExitStatus {
        tracing::debug!(entry = %entry, "dispatching");
        let result = match entry {
            EntryPoint::RunModule(module) => self.run_module(module, host),
            EntryPoint::CallFunction { module, function } => {
                self.call_function(module, function, host)
            }
        };

        match result {
            Ok(status) => status,
            Err(err) => {
                let err = explain_missing(entry, err);
                let _ = writeln!(stderr, "{}", err);
                ExitStatus::for_error(&err)
            }
        }
    }

    fn run_module(&mut self, module: &str, host: &mut dyn Host) -> Result<ExitStatus, RuntimeError> {
        if let Some(parent) = modpath::parent(module) {
            self.importer.import(parent, host)?;
        }

        let spec = self
            .importer
            .chain()
            .find(module)
            .ok_or_else(|| RuntimeError::ModuleNotFound(module.to_string()))?;

        let target = if spec.is_package() {
            self.importer.import(module, host)?;
            format!("{}.{}", module, MAIN_MODULE)
        } else {
            module.to_string()
        };

        if self.importer.chain().find(&target).is_none() {
            return Err(RuntimeError::entrypoint_missing(
                module,
                None,
                format!("'{}' is a package and cannot be directly executed", module),
            ));
        }

        self.importer.run_main(&target, host)?;
        Ok(ExitStatus::SUCCESS)
    }

    fn call_function(
        &mut self,
        module: &str,
        function: &str,
        host: &mut dyn Host,
    ) -> Result<ExitStatus, RuntimeError> {
        self.importer.import(module, host)?;

        let callee = self
            .importer
            .module(module)
            .and_then(|m| m.get(function))
            .cloned()
            .ok_or_else(|| {
                RuntimeError::entrypoint_missing(
                    module,
                    Some(function),
                    format!("module '{}' has no attribute '{}'", module, function),
                )
            })?;

        let value = host.call(&callee, &mut self.importer)?;
        tracing::debug!(returned = %value, "entry function returned");
        Ok(ExitStatus::from_return(&value))
    }
}

/// Rewrite "module not found" for the entry module (or one of its parents)
/// into an entry-point diagnostic. Failures raised by the program's own
/// imports pass through unchanged.
fn explain_missing(entry: &EntryPoint, err: RuntimeError) -> RuntimeError {
    let target = entry.module();
    let missing = match &err {
        RuntimeError::ModuleNotFound(name) => name.as_str(),
        RuntimeError::NotAPackage { name, .. } => name.as_str(),
        _ => return err,
    };
    let on_path = missing == target || modpath::ancestors(target).any(|a| a == missing);
    if on_path {
        RuntimeError::entrypoint_missing(target, entry.function(), err.to_string())
    } else {
        err
    }
}
