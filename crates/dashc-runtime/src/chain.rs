//! Ordered resolution chain
//!
//! A chain is a list of finders consulted front to back. The first finder
//! that recognizes a dotted name owns it: that finder also loads its
//! source. A finder that does not recognize a name simply defers.

use crate::error::RuntimeError;
use crate::modpath::ModuleKind;

/// Where a dotted name was found and how to treat it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Fully-qualified dotted name
    pub name: String,
    /// Package or plain module
    pub kind: ModuleKind,
    /// File identity of the module (archive-relative or disk path)
    pub origin: String,
    /// Search root for nested imports, set only for packages
    pub search_root: Option<String>,
    /// Name of the finder that produced the spec
    pub finder: &'static str,
}

impl ModuleSpec {
    pub fn is_package(&self) -> bool {
        self.kind == ModuleKind::Package
    }
}

/// A single handler in the resolution chain.
///
/// Implementations resolve only the exact dotted name they are asked for;
/// parents are resolved first, one segment at a time, by the importer.
pub trait Finder {
    /// Short name used in diagnostics and logs
    fn name(&self) -> &'static str;

    /// Recognize `name`. `None` is a normal outcome and defers to the next finder.
    fn find(&self, name: &str) -> Option<ModuleSpec>;

    /// Fetch the source backing a spec this finder produced.
    fn load(&self, spec: &ModuleSpec) -> Result<Vec<u8>, RuntimeError>;

    /// Whether an unrecognized `name` ends the search here instead of
    /// deferring to later finders.
    fn owns(&self, _name: &str) -> bool {
        false
    }
}

/// Ordered list of finders.
#[derive(Default)]
pub struct ResolutionChain {
    finders: Vec<Box<dyn Finder>>,
}

impl ResolutionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a finder at the front, ahead of every existing finder.
    pub fn install(&mut self, finder: Box<dyn Finder>) {
        tracing::debug!(finder = finder.name(), "installing finder at front of chain");
        self.finders.insert(0, finder);
    }

    /// Append a finder, behind every existing finder.
    pub fn push_back(&mut self, finder: Box<dyn Finder>) {
        self.finders.push(finder);
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }

    /// Finder names in consultation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.finders.iter().map(|f| f.name()).collect()
    }

    /// Ask each finder in turn until one recognizes `name`.
    pub fn find(&self, name: &str) -> Option<ModuleSpec> {
        self.find_with_owner(name).map(|(_, spec)| spec)
    }

    /// Find `name` and load its source from the finder that recognized it.
    pub fn resolve(&self, name: &str) -> Result<Option<(ModuleSpec, Vec<u8>)>, RuntimeError> {
        let Some((owner, spec)) = self.find_with_owner(name) else {
            return Ok(None);
        };
        let source = owner.load(&spec)?;
        tracing::debug!(module = name, finder = spec.finder, origin = %spec.origin, "resolved");
        Ok(Some((spec, source)))
    }

    fn find_with_owner(&self, name: &str) -> Option<(&dyn Finder, ModuleSpec)> {
        for finder in &self.finders {
            if let Some(spec) = finder.find(name) {
                return Some((finder.as_ref(), spec));
            }
            if finder.owns(name) {
                tracing::debug!(module = name, finder = finder.name(), "not found in owning finder");
                return None;
            }
        }
        None
    }
}

impl std::fmt::Debug for ResolutionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionChain")
            .field("finders", &self.names())
            .finish()
    }
}
