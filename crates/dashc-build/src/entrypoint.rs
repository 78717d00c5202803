//! Build-time entry-point resolution
//!
//! An explicit entry point is parsed and then checked against the archive.
//! Without one, every runnable package in the archive is a candidate and
//! the lexicographically first dotted name wins.

use dashc_runtime::modpath::{self, MAIN_MODULE};
use dashc_runtime::{Classification, EntryPoint, Finder, VirtualModuleResolver};

use crate::error::{BuildError, Result};

/// The chosen entry point and every candidate that was considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub entry: EntryPoint,
    /// Auto-detected candidates, sorted; empty for explicit entry points
    pub candidates: Vec<String>,
}

impl Resolution {
    pub fn is_explicit(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }

    /// Warning text naming every candidate, when more than one was found.
    pub fn ambiguity_warning(&self) -> Option<String> {
        self.is_ambiguous().then(|| {
            format!(
                "multiple runnable packages found: {}; using '{}' (pass an entry point to choose)",
                self.candidates.join(", "),
                self.entry
            )
        })
    }
}

/// Resolve the entry point for an archive, explicit or auto-detected.
pub fn resolve(explicit: Option<&str>, resolver: &VirtualModuleResolver) -> Result<Resolution> {
    let resolution = match explicit {
        Some(text) => Resolution {
            entry: text.parse()?,
            candidates: Vec::new(),
        },
        None => detect(resolver.classification())?,
    };
    verify(&resolution.entry, resolver)?;
    Ok(resolution)
}

/// Auto-detect a runnable package.
///
/// Candidates are packages whose ancestors are all packages and that hold a
/// `__main__` module, plus `__main__` itself when it sits at the root.
pub fn detect(classification: &Classification) -> Result<Resolution> {
    let mut candidates: Vec<String> = classification
        .runnable_packages()
        .filter(|pkg| modpath::ancestors(pkg).all(|a| classification.is_package(a)))
        .map(String::from)
        .collect();
    if classification.modules().any(|m| m == MAIN_MODULE) {
        candidates.push(MAIN_MODULE.to_string());
    }
    candidates.sort();

    let Some(first) = candidates.first() else {
        return Err(BuildError::EntrypointNotFound(
            "no package with a __main__.py was found; pass an entry point".to_string(),
        ));
    };

    let resolution = Resolution {
        entry: EntryPoint::run_module(first.clone()),
        candidates,
    };
    match resolution.ambiguity_warning() {
        Some(warning) => tracing::warn!("{}", warning),
        None => tracing::info!(entry = %resolution.entry, "entry point auto-detected"),
    }
    Ok(resolution)
}

/// Check that an entry point can be resolved in the archive.
///
/// The function of a `CallFunction` entry cannot be checked without running
/// the module; only the module is.
pub fn verify(entry: &EntryPoint, resolver: &VirtualModuleResolver) -> Result<()> {
    let module = entry.module();
    let classification = resolver.classification();

    if let Some(parent) = modpath::ancestors(module).find(|a| !classification.is_package(a)) {
        return Err(BuildError::EntrypointNotFound(format!(
            "'{}' is not a package in the archive (needed for '{}')",
            parent, entry
        )));
    }

    let spec = resolver.find(module).ok_or_else(|| {
        BuildError::EntrypointNotFound(format!("'{}' is not in the archive", module))
    })?;

    if matches!(entry, EntryPoint::RunModule(_)) && spec.is_package() {
        let main = format!("{}.{}", module, MAIN_MODULE);
        if resolver.find(&main).is_none() {
            return Err(BuildError::EntrypointNotFound(format!(
                "package '{}' has no __main__.py",
                module
            )));
        }
    }
    Ok(())
}
