//! File-system boundary consumed by the engine.
//!
//! The core performs no direct OS calls; everything it needs from storage
//! goes through the [`FileSystem`] trait. Two backends ship with the crate:
//!
//! - [`DiskFileSystem`] — `std::fs`-backed, the default for hosts.
//! - [`MemoryFileSystem`] — an in-memory tree used by tests and embeddings
//!   that stage content without touching disk.
//!
//! Custom backends are supplied as factories through a capability-keyed
//! [`BackendRegistry`] and resolved once at session start. All operations
//! are synchronous and blocking; a stalled read stalls the whole call.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, HashMap};

/// Read-only view of a content tree.
///
/// `read_directory` returns entry names in the backend's natural
/// enumeration order. The engine treats that order as authoritative and
/// never re-sorts it.
pub trait FileSystem {
    fn exists(&self, path: &Utf8Path) -> bool;

    fn is_directory(&self, path: &Utf8Path) -> bool;

    /// List the names (not full paths) of a directory's entries, or `None`
    /// if the path is not a readable directory.
    fn read_directory(&self, path: &Utf8Path) -> Option<Vec<String>>;

    /// Read a file's bytes, or `None` if it does not exist or is unreadable.
    fn read(&self, path: &Utf8Path) -> Option<Vec<u8>>;
}

/// `std::fs`-backed file system.
#[derive(Debug, Default, Clone)]
pub struct DiskFileSystem;

impl DiskFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for DiskFileSystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    fn is_directory(&self, path: &Utf8Path) -> bool {
        path.as_std_path().is_dir()
    }

    fn read_directory(&self, path: &Utf8Path) -> Option<Vec<String>> {
        let entries = std::fs::read_dir(path.as_std_path()).ok()?;
        let mut names = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::warn!("Skipping non-UTF-8 directory entry: {:?}", raw);
                }
            }
        }
        Some(names)
    }

    fn read(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        std::fs::read(path.as_std_path()).ok()
    }
}

/// In-memory file system keyed by normalized `/`-separated paths.
///
/// Directories are implicit: a path is a directory when any file lives
/// beneath it. Enumeration order is the sorted key order of the backing
/// map, which makes tests deterministic.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    files: BTreeMap<Utf8PathBuf, Vec<u8>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn add_file(&mut self, path: impl Into<Utf8PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Insert a UTF-8 text file.
    pub fn add_text(&mut self, path: impl Into<Utf8PathBuf>, text: &str) {
        self.add_file(path, text.as_bytes().to_vec());
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.files.contains_key(path) || self.is_directory(path)
    }

    fn is_directory(&self, path: &Utf8Path) -> bool {
        self.files.keys().any(|k| k.starts_with(path) && k != path)
    }

    fn read_directory(&self, path: &Utf8Path) -> Option<Vec<String>> {
        if !self.is_directory(path) {
            return None;
        }
        let mut names: Vec<String> = Vec::new();
        for key in self.files.keys() {
            let Ok(rest) = key.strip_prefix(path) else {
                continue;
            };
            let Some(first) = rest.components().next() else {
                continue;
            };
            let name = first.as_str().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Some(names)
    }

    fn read(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        self.files.get(path).cloned()
    }
}

/// Factory producing a file-system backend.
pub type BackendFactory = Box<dyn Fn() -> Result<Box<dyn FileSystem>>>;

/// Capability-keyed registry of file-system backends.
///
/// Hosts register factories under string keys and sessions resolve exactly
/// one backend at construction time. This replaces late-bound instantiation
/// by runtime type name: unknown keys and factory failures are the only
/// fatal-to-initialize conditions in the engine.
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

/// Key under which the disk backend is registered by default.
pub const DISK_BACKEND: &str = "disk";

impl BackendRegistry {
    /// An empty registry with no backends.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the [`DiskFileSystem`] registered under
    /// [`DISK_BACKEND`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(DISK_BACKEND, || Ok(Box::new(DiskFileSystem::new())));
        registry
    }

    /// Register a factory, replacing any previous one under the same key.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn FileSystem>> + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    /// Construct the backend registered under `key`.
    pub fn create(&self, key: &str) -> Result<Box<dyn FileSystem>> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| Error::UnknownBackend(key.to_string()))?;
        factory().map_err(|e| Error::BackendConstruction {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fs_layout() {
        let mut fs = MemoryFileSystem::new();
        fs.add_text("mods/a/mod.json", "{}");
        fs.add_text("mods/a/data/foo.txt", "foo");
        fs.add_text("mods/b/mod.json", "{}");

        assert!(fs.exists(Utf8Path::new("mods/a/mod.json")));
        assert!(fs.is_directory(Utf8Path::new("mods")));
        assert!(fs.is_directory(Utf8Path::new("mods/a/data")));
        assert!(!fs.is_directory(Utf8Path::new("mods/a/mod.json")));
        assert!(!fs.exists(Utf8Path::new("mods/c")));

        assert_eq!(
            fs.read_directory(Utf8Path::new("mods")).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            fs.read_directory(Utf8Path::new("mods/a")).unwrap(),
            vec!["data".to_string(), "mod.json".to_string()]
        );
        assert_eq!(
            fs.read(Utf8Path::new("mods/a/data/foo.txt")).unwrap(),
            b"foo".to_vec()
        );
    }

    #[test]
    fn test_disk_fs_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir(root.join("sub").as_std_path()).unwrap();
        std::fs::write(root.join("sub/file.txt").as_std_path(), b"hello").unwrap();

        let fs = DiskFileSystem::new();
        assert!(fs.exists(&root.join("sub/file.txt")));
        assert!(fs.is_directory(&root.join("sub")));
        let names = fs.read_directory(&root).unwrap();
        assert_eq!(names, vec!["sub".to_string()]);
        assert_eq!(fs.read(&root.join("sub/file.txt")).unwrap(), b"hello");
        assert!(fs.read(&root.join("missing")).is_none());
    }

    #[test]
    fn test_registry_default_and_custom() {
        let mut registry = BackendRegistry::new();
        assert!(registry.create(DISK_BACKEND).is_ok());
        assert!(matches!(
            registry.create("tape"),
            Err(Error::UnknownBackend(_))
        ));

        registry.register("memory", || Ok(Box::new(MemoryFileSystem::new())));
        assert!(registry.create("memory").is_ok());

        registry.register("broken", || {
            Err(Error::BackendConstruction {
                key: "broken".to_string(),
                reason: "nope".to_string(),
            })
        });
        assert!(matches!(
            registry.create("broken"),
            Err(Error::BackendConstruction { .. })
        ));
    }
}
