//! Import machinery over a resolution chain
//!
//! The importer owns the chain and the table of executed modules. A dotted
//! import walks its ancestors outermost first, so every parent package is
//! executed (and its search root known) before the chain is asked for the
//! child. Executing source is delegated to a [`Host`].

use std::collections::{BTreeMap, HashMap};

use crate::chain::{ModuleSpec, ResolutionChain};
use crate::error::RuntimeError;
use crate::modpath::{self, MAIN_MODULE};
use crate::module::{Module, Value};

/// The interpreter that executes module source.
pub trait Host {
    /// Execute `source` in the namespace `module`. Imports performed by the
    /// source go back through `imports`.
    fn exec_module(
        &mut self,
        module: &mut Module,
        source: &[u8],
        imports: &mut Importer,
    ) -> Result<(), RuntimeError>;

    /// Call a value with no arguments.
    fn call(&mut self, callee: &Value, imports: &mut Importer) -> Result<Value, RuntimeError>;
}

/// Imports modules through a [`ResolutionChain`] and remembers the results.
#[derive(Debug)]
pub struct Importer {
    chain: ResolutionChain,
    modules: BTreeMap<String, Module>,
    /// Modules whose code is currently executing, with their package flag
    in_progress: HashMap<String, bool>,
}

impl Importer {
    pub fn new(chain: ResolutionChain) -> Self {
        Self {
            chain,
            modules: BTreeMap::new(),
            in_progress: HashMap::new(),
        }
    }

    pub fn chain(&self) -> &ResolutionChain {
        &self.chain
    }

    /// An executed module by the key it was stored under.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Names of every executed module, sorted.
    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(|k| k.as_str())
    }

    /// Import `name`, importing each parent package first.
    pub fn import(&mut self, name: &str, host: &mut dyn Host) -> Result<(), RuntimeError> {
        if !modpath::is_valid_dotted(name) {
            return Err(RuntimeError::ModuleNotFound(name.to_string()));
        }
        for ancestor in modpath::ancestors(name) {
            self.import_one(ancestor, host)?;
        }
        self.import_one(name, host)
    }

    /// Execute `name` as the main program.
    ///
    /// Parents must already be imported. The namespace is stored under
    /// `__main__`, not under `name`.
    pub fn run_main(&mut self, name: &str, host: &mut dyn Host) -> Result<(), RuntimeError> {
        self.check_parent(name)?;
        let (spec, source) = self
            .chain
            .resolve(name)?
            .ok_or_else(|| RuntimeError::ModuleNotFound(name.to_string()))?;
        tracing::debug!(module = name, origin = %spec.origin, "running as main program");
        self.execute(&spec, &source, MAIN_MODULE, MAIN_MODULE, host)
    }

    fn import_one(&mut self, name: &str, host: &mut dyn Host) -> Result<(), RuntimeError> {
        if self.modules.contains_key(name) || self.in_progress.contains_key(name) {
            return Ok(());
        }
        self.check_parent(name)?;

        let (spec, source) = self
            .chain
            .resolve(name)?
            .ok_or_else(|| RuntimeError::ModuleNotFound(name.to_string()))?;
        self.execute(&spec, &source, name, name, host)
    }

    /// The parent of a nested name must be a package.
    fn check_parent(&self, name: &str) -> Result<(), RuntimeError> {
        let Some(parent) = modpath::parent(name) else {
            return Ok(());
        };
        let is_package = match self.modules.get(parent) {
            Some(module) => module.is_package(),
            None => self.in_progress.get(parent).copied().unwrap_or(false),
        };
        if is_package {
            Ok(())
        } else {
            Err(RuntimeError::NotAPackage {
                name: name.to_string(),
                parent: parent.to_string(),
            })
        }
    }

    fn execute(
        &mut self,
        spec: &ModuleSpec,
        source: &[u8],
        key: &str,
        identity: &str,
        host: &mut dyn Host,
    ) -> Result<(), RuntimeError> {
        let mut module = Module::from_spec(spec, identity);
        self.in_progress.insert(key.to_string(), spec.is_package());
        let result = host.exec_module(&mut module, source, self);
        self.in_progress.remove(key);
        result?;

        self.store(key, module);
        Ok(())
    }

    /// Store an executed module and bind it into its parent, and bind any
    /// children that finished while it was still executing.
    fn store(&mut self, key: &str, mut module: Module) {
        if key != MAIN_MODULE {
            let prefix = format!("{}.", key);
            for child in self.modules.keys().filter(|k| {
                k.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| !rest.contains('.'))
            }) {
                module.set(modpath::leaf(child), Value::Module(child.clone()));
            }
            if let Some(parent) = modpath::parent(key).and_then(|p| self.modules.get_mut(p)) {
                parent.set(modpath::leaf(key), Value::Module(key.to_string()));
            }
        }
        self.modules.insert(key.to_string(), module);
    }
}
