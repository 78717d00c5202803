//! Archive builder
//!
//! Packs every regular file under a root directory into an in-memory zip
//! container. Archive paths are relative to the root and always use `/`.
//! Entries are written in sorted path order with fixed timestamps and
//! permissions, so the same tree always produces the same bytes.

use std::fmt;
use std::io::{Cursor, Write};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

use crate::config::ConfigError;
use crate::error::{BuildError, Result};

/// Exclusions applied when none are configured.
pub const DEFAULT_EXCLUDES: &[&str] = &["__pycache__", "*.pyc"];

/// Per-entry compression inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    Stored,
    #[default]
    Deflated,
    Bzip2,
    Lzma,
}

impl CompressionMethod {
    pub fn name(self) -> &'static str {
        match self {
            CompressionMethod::Stored => "stored",
            CompressionMethod::Deflated => "deflate",
            CompressionMethod::Bzip2 => "bzip2",
            CompressionMethod::Lzma => "lzma",
        }
    }

    /// Accepted levels, `None` when the method takes no level.
    pub fn level_range(self) -> Option<RangeInclusive<i64>> {
        match self {
            CompressionMethod::Stored => None,
            CompressionMethod::Deflated => Some(0..=9),
            CompressionMethod::Bzip2 => Some(1..=9),
            CompressionMethod::Lzma => Some(0..=9),
        }
    }

    pub fn check_level(self, level: Option<i64>) -> Result<Option<i64>> {
        let Some(level) = level else {
            return Ok(None);
        };
        match self.level_range() {
            Some(range) if range.contains(&level) => Ok(Some(level)),
            Some(range) => Err(BuildError::InvalidCompressionLevel {
                method: self.name(),
                level,
                expected: match (range.start(), range.end()) {
                    (0, 9) => "expected 0-9",
                    _ => "expected 1-9",
                },
            }),
            None => Err(BuildError::InvalidCompressionLevel {
                method: self.name(),
                level,
                expected: "stored takes no level",
            }),
        }
    }

    fn to_zip(self) -> zip::CompressionMethod {
        match self {
            CompressionMethod::Stored => zip::CompressionMethod::Stored,
            CompressionMethod::Deflated => zip::CompressionMethod::Deflated,
            CompressionMethod::Bzip2 => zip::CompressionMethod::Bzip2,
            CompressionMethod::Lzma => zip::CompressionMethod::Lzma,
        }
    }
}

impl FromStr for CompressionMethod {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stored" | "store" | "none" => Ok(CompressionMethod::Stored),
            "deflate" | "deflated" => Ok(CompressionMethod::Deflated),
            "bzip2" | "bz2" => Ok(CompressionMethod::Bzip2),
            "lzma" | "xz" => Ok(CompressionMethod::Lzma),
            _ => Err(BuildError::UnknownCompressionMethod(s.to_string())),
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How to build an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveOptions {
    pub method: CompressionMethod,
    pub level: Option<i64>,
    /// Glob patterns matched against every path component and the full
    /// relative path
    pub exclude: Vec<String>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::default(),
            level: None,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A built container and the paths stored in it.
#[derive(Debug, Clone)]
pub struct Archive {
    pub bytes: Vec<u8>,
    pub paths: Vec<String>,
}

/// Collects a directory tree into an archive.
pub struct ArchiveBuilder {
    root: PathBuf,
    method: CompressionMethod,
    level: Option<i64>,
    exclude: Vec<glob::Pattern>,
}

impl ArchiveBuilder {
    pub fn new(root: impl Into<PathBuf>, options: &ArchiveOptions) -> Result<Self> {
        let level = options.method.check_level(options.level)?;
        let exclude = options
            .exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            root: root.into(),
            method: options.method,
            level,
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        let path = archive_path(relative);
        self.exclude.iter().any(|pattern| {
            pattern.matches(&path) || path.split('/').any(|component| pattern.matches(component))
        })
    }

    /// Every file that will be archived, as (archive path, disk path), sorted.
    pub fn collect(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match entry.path().strip_prefix(&self.root) {
                Ok(relative) if relative.as_os_str().is_empty() => true,
                Ok(relative) => !self.is_excluded(relative),
                Err(_) => false,
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                BuildError::io(path, source)
            })?;

            // Symlinked files are archived; symlinked directories are not walked.
            let file_type = entry.file_type();
            let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| {
                    BuildError::io(
                        entry.path(),
                        std::io::Error::other("path escapes the archive root"),
                    )
                })?;
            files.push((archive_path(relative), entry.path().to_path_buf()));
        }

        files.sort();
        Ok(files)
    }

    /// Read every file and write the container.
    ///
    /// All files are read before anything is written; a file that cannot be
    /// read aborts the build.
    pub fn build(&self) -> Result<Archive> {
        let files = self.collect()?;
        let mut contents = Vec::with_capacity(files.len());
        for (name, path) in &files {
            let data = std::fs::read(path).map_err(|e| BuildError::io(path, e))?;
            contents.push((name.as_str(), data));
        }

        let options = SimpleFileOptions::default()
            .compression_method(self.method.to_zip())
            .compression_level(self.level)
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &contents {
            writer.start_file(*name, options)?;
            writer
                .write_all(data)
                .map_err(|e| BuildError::io(self.root.join(name), e))?;
        }
        let bytes = writer.finish()?.into_inner();

        tracing::info!(
            files = files.len(),
            bytes = bytes.len(),
            method = %self.method,
            "archive built"
        );
        Ok(Archive {
            bytes,
            paths: files.into_iter().map(|(name, _)| name).collect(),
        })
    }
}

/// `/`-separated archive path for a path relative to the root.
fn archive_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashc_runtime::ArchiveIndex;
    use std::fs;

    fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_method_names() {
        assert_eq!("deflate".parse::<CompressionMethod>().unwrap(), CompressionMethod::Deflated);
        assert_eq!("STORED".parse::<CompressionMethod>().unwrap(), CompressionMethod::Stored);
        assert_eq!("bzip2".parse::<CompressionMethod>().unwrap(), CompressionMethod::Bzip2);
        assert_eq!("lzma".parse::<CompressionMethod>().unwrap(), CompressionMethod::Lzma);
        assert!(matches!(
            "zstd".parse::<CompressionMethod>(),
            Err(BuildError::UnknownCompressionMethod(name)) if name == "zstd"
        ));
    }

    #[test]
    fn test_level_ranges() {
        use CompressionMethod::*;
        assert_eq!(Deflated.check_level(Some(0)).unwrap(), Some(0));
        assert_eq!(Deflated.check_level(Some(9)).unwrap(), Some(9));
        assert!(Deflated.check_level(Some(10)).is_err());
        assert!(Bzip2.check_level(Some(0)).is_err());
        assert_eq!(Bzip2.check_level(Some(1)).unwrap(), Some(1));
        assert!(Lzma.check_level(Some(-1)).is_err());
        assert!(matches!(
            Stored.check_level(Some(1)),
            Err(BuildError::InvalidCompressionLevel { method: "stored", .. })
        ));
        assert_eq!(Stored.check_level(None).unwrap(), None);
    }

    #[test]
    fn test_collect_uses_forward_slashes_and_skips_excluded() {
        let dir = tree(&[
            ("pkg/__init__.py", ""),
            ("pkg/sub/mod.py", "x = 1"),
            ("pkg/__pycache__/mod.cpython-311.pyc", "junk"),
            ("pkg/stale.pyc", "junk"),
            ("README.md", "docs"),
        ]);
        let builder = ArchiveBuilder::new(dir.path(), &ArchiveOptions::default()).unwrap();
        let names: Vec<_> = builder.collect().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["README.md", "pkg/__init__.py", "pkg/sub/mod.py"]);
    }

    #[test]
    fn test_custom_excludes_match_relative_paths() {
        let dir = tree(&[("app/main.py", ""), ("tests/test_app.py", ""), ("notes.txt", "")]);
        let options = ArchiveOptions {
            exclude: vec!["tests".to_string(), "*.txt".to_string()],
            ..ArchiveOptions::default()
        };
        let builder = ArchiveBuilder::new(dir.path(), &options).unwrap();
        let names: Vec<_> = builder.collect().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["app/main.py"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let options = ArchiveOptions {
            exclude: vec!["[".to_string()],
            ..ArchiveOptions::default()
        };
        assert!(matches!(
            ArchiveBuilder::new(".", &options),
            Err(BuildError::Config(ConfigError::InvalidPattern { .. }))
        ));
    }

    #[test]
    fn test_build_is_reproducible_and_faithful() {
        let dir = tree(&[
            ("pkg/__init__.py", ""),
            ("pkg/data.bin", "\u{0}\u{1}binary"),
            ("pkg/mod.py", "print('hi')\n"),
        ]);
        for method in ["stored", "deflate", "bzip2"] {
            let options = ArchiveOptions {
                method: method.parse().unwrap(),
                ..ArchiveOptions::default()
            };
            let builder = ArchiveBuilder::new(dir.path(), &options).unwrap();
            let first = builder.build().unwrap();
            let second = builder.build().unwrap();
            assert_eq!(first.bytes, second.bytes, "{}", method);

            let index = ArchiveIndex::from_zip_bytes(&first.bytes).unwrap();
            assert_eq!(index.len(), 3);
            assert_eq!(index.get("pkg/mod.py"), Some(&b"print('hi')\n"[..]));
            assert_eq!(index.get("pkg/data.bin"), Some(&b"\0\x01binary"[..]));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_followed() {
        let dir = tree(&[("real/shared.py", "X = 1"), ("pkg/__init__.py", "")]);
        std::os::unix::fs::symlink(
            dir.path().join("real/shared.py"),
            dir.path().join("pkg/shared.py"),
        )
        .unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("linked_dir")).unwrap();

        let builder = ArchiveBuilder::new(dir.path(), &ArchiveOptions::default()).unwrap();
        let archive = builder.build().unwrap();
        assert_eq!(
            archive.paths,
            vec!["pkg/__init__.py", "pkg/shared.py", "real/shared.py"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_aborts() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tree(&[("pkg/__init__.py", ""), ("pkg/secret.py", "x")]);
        let secret = dir.path().join("pkg/secret.py");
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&secret).is_ok() {
            // Running with privileges that ignore file modes.
            return;
        }

        let builder = ArchiveBuilder::new(dir.path(), &ArchiveOptions::default()).unwrap();
        match builder.build() {
            Err(BuildError::Io { path, .. }) => assert_eq!(path, secret),
            other => panic!("expected io error, got {:?}", other.map(|a| a.paths)),
        }
    }
}
