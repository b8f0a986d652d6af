//! Virtual file set: stable file identifiers and directory-relative lookup.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::RwLock;

/// A stable handle for a source file known to the [`Vfs`].
///
/// Handles are assigned on first sight of a path and never reused, so a
/// `FileId` stays valid across edits of the file's contents.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(u32);

impl FileId {
    /// Wrap a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Path ↔ [`FileId`] mapping for every file in the workspace.
///
/// The set only knows about paths; file contents are owned by whoever
/// parses them. Lookups take a read lock, so the set can be shared by
/// concurrent queries.
#[derive(Debug, Default)]
pub struct Vfs {
    inner: RwLock<VfsInner>,
}

#[derive(Debug, Default)]
struct VfsInner {
    by_path: IndexMap<PathBuf, FileId>,
    by_id: IndexMap<FileId, PathBuf>,
    next_id: u32,
}

impl Vfs {
    /// Create an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id of `path`, allocating one if the path is new.
    pub fn intern(&self, path: &Path) -> FileId {
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.by_path.get(path) {
                return id;
            }
        }

        let mut inner = self.inner.write();
        if let Some(&id) = inner.by_path.get(path) {
            return id;
        }
        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.by_path.insert(path.to_owned(), id);
        inner.by_id.insert(id, path.to_owned());
        id
    }

    /// Id of an already known path.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.inner.read().by_path.get(path).copied()
    }

    /// Path of a known file.
    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().by_id.get(&file).cloned()
    }

    /// Forget a file. Its id is not handed out again.
    pub fn remove(&self, file: FileId) {
        let mut inner = self.inner.write();
        if let Some(path) = inner.by_id.swap_remove(&file) {
            inner.by_path.swap_remove(&path);
        }
    }

    /// Resolve `relative` (forward-slash separated) against `dir`.
    ///
    /// Returns `None` unless the resulting path is a known file.
    pub fn find_relative(&self, dir: &Path, relative: &str) -> Option<FileId> {
        let mut path = dir.to_path_buf();
        for part in relative.split('/').filter(|p| !p.is_empty()) {
            match part {
                "." => {}
                ".." => {
                    if !path.pop() {
                        return None;
                    }
                }
                _ => path.push(part),
            }
        }
        self.lookup(&path)
    }

    /// Number of known files.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All known file ids, in insertion order.
    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().by_id.keys().copied().collect()
    }
}
