//! Dotted module names and archive paths
//!
//! Archive paths always use `/`. A dotted name `a.b.c` corresponds to the
//! path `a/b/c`; the two conversions below are total and inverse to each
//! other. Whether that path is a package or a module is decided by the
//! file that backs it:
//!
//! ```text
//! a/b/__init__.py  ->  package  a.b
//! a/b/c.py         ->  module   a.b.c
//! a/b/data.json    ->  (not code)
//! ```

/// File whose presence makes a directory an importable package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// File that makes a package runnable as the main program.
pub const MAIN_MARKER: &str = "__main__.py";

/// Dotted segment executed when a package is run as the main program.
pub const MAIN_MODULE: &str = "__main__";

/// Extension of source files served as modules.
pub const SOURCE_SUFFIX: &str = ".py";

/// Kind of node a dotted name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    /// A directory carrying the package marker
    Package,
    /// A plain source file
    Module,
}

/// Convert a dotted name to its slash-separated path (`a.b.c` -> `a/b/c`).
pub fn dotted_to_path(dotted: &str) -> String {
    dotted.replace('.', "/")
}

/// Convert a slash-separated path to its dotted name (`a/b/c` -> `a.b.c`).
pub fn path_to_dotted(path: &str) -> String {
    path.replace('/', ".")
}

/// Archive path of the file that backs `dotted` when it is of `kind`.
pub fn source_path(dotted: &str, kind: ModuleKind) -> String {
    match kind {
        ModuleKind::Package => format!("{}/{}", dotted_to_path(dotted), PACKAGE_MARKER),
        ModuleKind::Module => format!("{}{}", dotted_to_path(dotted), SOURCE_SUFFIX),
    }
}

/// Classify an archive path as the package or module it defines, if any.
///
/// The package marker at the archive root defines nothing, and neither does
/// a path with a segment that is not an identifier.
pub fn classify_path(path: &str) -> Option<(String, ModuleKind)> {
    if path == PACKAGE_MARKER {
        return None;
    }

    let package_dir = path
        .strip_suffix(PACKAGE_MARKER)
        .and_then(|dir| dir.strip_suffix('/'));
    let (stem, kind) = match package_dir {
        Some(dir) => (dir, ModuleKind::Package),
        None => (path.strip_suffix(SOURCE_SUFFIX)?, ModuleKind::Module),
    };

    if stem.is_empty() || !stem.split('/').all(is_identifier) {
        return None;
    }

    Some((path_to_dotted(stem), kind))
}

/// Whether `segment` is a valid identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Whether every segment of `dotted` is an identifier.
pub fn is_valid_dotted(dotted: &str) -> bool {
    !dotted.is_empty() && dotted.split('.').all(is_identifier)
}

/// Parent of a dotted name (`a.b.c` -> `a.b`), `None` for top-level names.
pub fn parent(dotted: &str) -> Option<&str> {
    dotted.rsplit_once('.').map(|(parent, _)| parent)
}

/// Last segment of a dotted name.
pub fn leaf(dotted: &str) -> &str {
    dotted.rsplit_once('.').map(|(_, leaf)| leaf).unwrap_or(dotted)
}

/// Every proper ancestor of a dotted name, outermost first.
pub fn ancestors(dotted: &str) -> impl Iterator<Item = &str> {
    dotted
        .match_indices('.')
        .map(move |(idx, _)| &dotted[..idx])
}

/// Normalize a path for archive lookup.
///
/// - Replace backslashes with forward slashes
/// - Remove leading `./`
/// - Remove trailing `/`
pub fn normalize_path(path: &str) -> String {
    let mut p = path.replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    while p.ends_with('/') {
        p.pop();
    }
    p
}
