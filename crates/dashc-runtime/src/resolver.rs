//! Finders: the archive-backed virtual module resolver and a disk fallback

use std::path::PathBuf;

use crate::chain::{Finder, ModuleSpec};
use crate::error::RuntimeError;
use crate::index::{ArchiveIndex, Classification};
use crate::modpath::{self, ModuleKind};

/// Serves modules and packages out of an in-memory archive.
///
/// The classification is computed once from the index; neither changes
/// after construction.
#[derive(Debug, Clone)]
pub struct VirtualModuleResolver {
    index: ArchiveIndex,
    classification: Classification,
}

impl VirtualModuleResolver {
    pub const NAME: &'static str = "archive";

    pub fn new(index: ArchiveIndex) -> Self {
        let classification = Classification::from_index(&index);
        Self {
            index,
            classification,
        }
    }

    /// Pair an index with a classification computed elsewhere.
    ///
    /// Nothing checks that the two agree; a name classified here but absent
    /// from the index surfaces as [`RuntimeError::ResolverInconsistency`]
    /// when it is loaded.
    pub fn with_classification(index: ArchiveIndex, classification: Classification) -> Self {
        Self {
            index,
            classification,
        }
    }

    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Read a non-code file stored under a package's archive directory.
    pub fn read_resource(&self, package: &str, resource: &str) -> Result<&[u8], RuntimeError> {
        if !self.classification.is_package(package) {
            return Err(RuntimeError::ModuleNotFound(package.to_string()));
        }
        let path = modpath::normalize_path(&format!(
            "{}/{}",
            modpath::dotted_to_path(package),
            resource
        ));
        self.index
            .get(&path)
            .ok_or_else(|| RuntimeError::ResourceNotFound {
                package: package.to_string(),
                resource: resource.to_string(),
            })
    }

    /// Resource names directly inside a package's directory.
    pub fn resources(&self, package: &str) -> Vec<&str> {
        let prefix = format!("{}/", modpath::dotted_to_path(package));
        self.index
            .paths()
            .filter_map(|p| p.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.contains('/'))
            .collect()
    }
}

impl Finder for VirtualModuleResolver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn find(&self, name: &str) -> Option<ModuleSpec> {
        let kind = self.classification.kind_of(name)?;
        let search_root = match kind {
            ModuleKind::Package => Some(modpath::dotted_to_path(name)),
            ModuleKind::Module => None,
        };
        Some(ModuleSpec {
            name: name.to_string(),
            kind,
            origin: modpath::source_path(name, kind),
            search_root,
            finder: Self::NAME,
        })
    }

    fn load(&self, spec: &ModuleSpec) -> Result<Vec<u8>, RuntimeError> {
        let kind = self
            .classification
            .kind_of(&spec.name)
            .ok_or_else(|| RuntimeError::ModuleNotFound(spec.name.clone()))?;
        let path = modpath::source_path(&spec.name, kind);
        match self.index.get(&path) {
            Some(source) => Ok(source.to_vec()),
            None => {
                tracing::error!(module = %spec.name, path = %path, "classified module missing from archive");
                Err(RuntimeError::ResolverInconsistency {
                    name: spec.name.clone(),
                    path,
                })
            }
        }
    }

    /// Children of archived packages are never looked up elsewhere.
    fn owns(&self, name: &str) -> bool {
        modpath::parent(name).is_some_and(|parent| self.classification.is_package(parent))
    }
}

/// Resolves modules from a directory on disk, like a host search path entry.
#[derive(Debug, Clone)]
pub struct DirectoryFinder {
    root: PathBuf,
}

impl DirectoryFinder {
    pub const NAME: &'static str = "directory";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Finder for DirectoryFinder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn find(&self, name: &str) -> Option<ModuleSpec> {
        if !modpath::is_valid_dotted(name) {
            return None;
        }
        [ModuleKind::Package, ModuleKind::Module]
            .into_iter()
            .find(|kind| self.root.join(modpath::source_path(name, *kind)).is_file())
            .map(|kind| ModuleSpec {
                name: name.to_string(),
                kind,
                origin: self
                    .root
                    .join(modpath::source_path(name, kind))
                    .display()
                    .to_string(),
                search_root: (kind == ModuleKind::Package).then(|| {
                    self.root
                        .join(modpath::dotted_to_path(name))
                        .display()
                        .to_string()
                }),
                finder: Self::NAME,
            })
    }

    fn load(&self, spec: &ModuleSpec) -> Result<Vec<u8>, RuntimeError> {
        std::fs::read(&spec.origin)
            .map_err(|e| RuntimeError::application("OSError", format!("{}: {}", spec.origin, e)))
    }
}
