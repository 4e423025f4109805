//! The filesystem calls the resolver depends on.
//!
//! Resolution only ever checks for the target file, reads it, and creates
//! directories. Keeping those three calls behind [`FileSystem`] lets the
//! resolver run against [`MemoryFileSystem`] in tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Blocking filesystem operations used during resolution.
pub trait FileSystem {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Read the whole file at `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Create `path` and every missing parent. An existing directory is not an error.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path)
    }
}

/// The real filesystem, via `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

/// In-memory filesystem for exercising the resolver without touching disk.
///
/// Paths are compared verbatim, so callers should hand it absolute paths.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
    denied: Vec<PathBuf>,
    create_calls: Cell<usize>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given raw contents.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.borrow_mut().insert(path.into(), contents.into());
        self
    }

    /// Add an existing directory (and its parents).
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
        drop(dirs);
        self
    }

    /// Reject directory creation anywhere under `prefix` with `PermissionDenied`.
    pub fn deny_under(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.denied.push(prefix.into());
        self
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.dirs.borrow().contains(path)
    }

    /// Number of `create_dir_all` calls made so far.
    pub fn create_calls(&self) -> usize {
        self.create_calls.get()
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.dirs.borrow().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        let files = self.files.borrow();
        let bytes = files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })?;
        String::from_utf8(bytes.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.create_calls.set(self.create_calls.get() + 1);

        if self.denied.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }

        let mut chain: Vec<&Path> = path.ancestors().collect();
        chain.reverse();

        let files = self.files.borrow();
        for ancestor in &chain {
            if files.contains_key(*ancestor) {
                let kind = if *ancestor == path {
                    io::ErrorKind::AlreadyExists
                } else {
                    io::ErrorKind::NotADirectory
                };
                return Err(io::Error::new(
                    kind,
                    format!("{} is not a directory", ancestor.display()),
                ));
            }
        }

        let mut dirs = self.dirs.borrow_mut();
        for ancestor in chain {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }
}
