//! Archive index and package classification
//!
//! The index is the decompressed archive held in memory: normalized
//! archive path -> file bytes. The classification is derived from it once
//! and answers "is this dotted name a package, a module, or unknown?".

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};

use crate::codec;
use crate::error::RuntimeError;
use crate::modpath::{self, ModuleKind};

/// Immutable map of archive path -> raw bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveIndex {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ArchiveIndex {
    /// Create an index from (path, data) pairs. Paths are normalized.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, Vec<u8>)>,
        P: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(path, data)| (modpath::normalize_path(path.as_ref()), data))
            .collect();
        Self { entries }
    }

    /// Read every file entry of an in-memory zip container.
    ///
    /// Directory entries are skipped; any read failure is data corruption.
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self, RuntimeError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| RuntimeError::DataCorruption(format!("invalid archive: {}", e)))?;

        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| {
                RuntimeError::DataCorruption(format!("archive entry {}: {}", i, e))
            })?;
            if entry.is_dir() {
                continue;
            }

            let path = modpath::normalize_path(entry.name());
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data).map_err(|e| {
                RuntimeError::DataCorruption(format!("archive entry {}: {}", path, e))
            })?;
            entries.insert(path, data);
        }

        tracing::debug!(entries = entries.len(), "archive index built");
        Ok(Self { entries })
    }

    /// Decode a compressed payload and index the archive inside it.
    pub fn from_payload(payload: &str) -> Result<Self, RuntimeError> {
        let bytes = codec::decode(payload)?;
        Self::from_zip_bytes(&bytes)
    }

    /// Raw bytes stored at `path`.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(|data| data.as_slice())
    }

    /// Check if a path exists in the index.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All paths in the index, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of all stored files in bytes.
    pub fn total_size(&self) -> usize {
        self.entries.values().map(|data| data.len()).sum()
    }
}

/// The set of dotted names that are packages vs. plain modules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    packages: BTreeSet<String>,
    modules: BTreeSet<String>,
}

impl Classification {
    /// Derive the classification from every path of `index`.
    pub fn from_index(index: &ArchiveIndex) -> Self {
        Self::from_paths(index.paths())
    }

    /// Derive the classification from a list of archive paths.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classification = Self::default();
        for path in paths {
            match modpath::classify_path(path) {
                Some((dotted, ModuleKind::Package)) => {
                    classification.packages.insert(dotted);
                }
                Some((dotted, ModuleKind::Module)) => {
                    classification.modules.insert(dotted);
                }
                None => {}
            }
        }
        classification
    }

    /// Build a classification directly from name sets.
    pub fn new(packages: BTreeSet<String>, modules: BTreeSet<String>) -> Self {
        Self { packages, modules }
    }

    /// Classify a dotted name. Packages win over a same-named module file.
    pub fn kind_of(&self, dotted: &str) -> Option<ModuleKind> {
        if self.packages.contains(dotted) {
            Some(ModuleKind::Package)
        } else if self.modules.contains(dotted) {
            Some(ModuleKind::Module)
        } else {
            None
        }
    }

    pub fn is_package(&self, dotted: &str) -> bool {
        self.packages.contains(dotted)
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|s| s.as_str())
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|s| s.as_str())
    }

    /// Packages that can be run as the main program (`<pkg>.__main__` exists).
    pub fn runnable_packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|s| s.as_str()).filter(move |pkg| {
            self.modules
                .contains(&format!("{}.{}", pkg, modpath::MAIN_MODULE))
        })
    }
}
