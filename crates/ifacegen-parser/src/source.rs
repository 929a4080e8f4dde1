//! Where IDL documents come from

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::ParserError;

/// Supplies the text of IDL documents to the loader.
pub trait IdlSource {
    fn read(&self, path: &Path) -> Result<String, ParserError>;

    /// Key under which a document is cached and checked for import cycles.
    fn canonical(&self, path: &Path) -> PathBuf {
        normalize_path(path)
    }
}

/// Reads documents from disk. The file is read in one call, so no handle
/// outlives it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl IdlSource for FsSource {
    fn read(&self, path: &Path) -> Result<String, ParserError> {
        std::fs::read_to_string(path).map_err(|source| ParserError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| normalize_path(path))
    }
}

/// In-memory documents keyed by path, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.documents
            .insert(normalize_path(path.as_ref()), text.into());
    }
}

impl IdlSource for MemorySource {
    fn read(&self, path: &Path) -> Result<String, ParserError> {
        self.documents
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| ParserError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
            })
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("a/./b/../c.json")), PathBuf::from("a/c.json"));
        assert_eq!(normalize_path(Path::new("./c.json")), PathBuf::from("c.json"));
        assert_eq!(normalize_path(Path::new("../c.json")), PathBuf::from("../c.json"));
        assert_eq!(normalize_path(Path::new("../../c.json")), PathBuf::from("../../c.json"));
    }

    #[test]
    fn test_memory_source_lookup_is_normalized() {
        let source = MemorySource::new().with("idl/common.json", "{}");
        assert_eq!(source.read(Path::new("idl/./common.json")).unwrap(), "{}");
        assert!(matches!(
            source.read(Path::new("idl/missing.json")),
            Err(ParserError::Io { .. })
        ));
    }
}
