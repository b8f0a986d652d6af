//! Version-stamped memo caches and the recursion guard.

use std::cell::{Cell, RefCell};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::FileId;
use crate::syntax::{NodeId, QualifiedPath, UnresolvedTy};

use super::resolve::ResolveResult;
use super::ty::Ty;

/// A memo table whose entries are only valid at the version they were
/// computed at.
#[derive(Debug)]
pub struct VersionedCache<K, V> {
    entries: RwLock<FxHashMap<K, (u64, V)>>,
}

impl<K, V> Default for VersionedCache<K, V> {
    fn default() -> Self {
        Self { entries: RwLock::new(FxHashMap::default()) }
    }
}

impl<K: Eq + Hash, V: Clone> VersionedCache<K, V> {
    /// The cached value, if it was stored at `version`.
    pub fn get(&self, key: &K, version: u64) -> Option<V> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some((stamp, value)) if *stamp == version => Some(value.clone()),
            _ => None,
        }
    }

    pub fn insert(&self, key: K, version: u64, value: V) {
        self.entries.write().insert(key, (version, value));
    }

    /// Drop every entry not stamped with `version`.
    pub fn retain_version(&self, version: u64) {
        self.entries.write().retain(|_, (stamp, _)| *stamp == version);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key of a resolve-cache entry: path, pivot, and whether the path is
/// being resolved as the qualifier of a longer path.
pub type PathKey = (QualifiedPath, NodeId, bool);

/// Key of a written-type cache entry: the type as written and where.
pub type WrittenTyKey = (UnresolvedTy, NodeId);

/// Every cache shared by resolver sessions over one workspace.
#[derive(Debug, Default)]
pub struct Caches {
    pub(crate) paths: VersionedCache<PathKey, ResolveResult>,
    pub(crate) decl_types: VersionedCache<NodeId, Ty>,
    pub(crate) expr_types: VersionedCache<NodeId, Ty>,
    pub(crate) written_types: VersionedCache<WrittenTyKey, Ty>,
    pub(crate) mod_decls: VersionedCache<NodeId, ResolveResult>,
    /// File → the `mod` declaration that owns it.
    pub(crate) declaring_mods: VersionedCache<(), Arc<FxHashMap<FileId, NodeId>>>,
}

impl Caches {
    /// Evict entries from older versions.
    pub fn sweep(&self, version: u64) {
        self.paths.retain_version(version);
        self.decl_types.retain_version(version);
        self.expr_types.retain_version(version);
        self.written_types.retain_version(version);
        self.mod_decls.retain_version(version);
        self.declaring_mods.retain_version(version);
    }
}

// ============================================================================
// RECURSION GUARD
// ============================================================================

/// An operation that may re-enter itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GuardKey {
    Path(PathKey),
    UseItem(NodeId, usize),
    GlobTarget(NodeId),
    Typify(NodeId),
    TypifyExpr(NodeId),
    ResolveType(WrittenTyKey),
    ModDecl(NodeId),
}

/// Per-session set of in-progress operations.
///
/// Sessions are single-threaded, so interior mutability is plain
/// `Cell`/`RefCell`. `cycles` counts short-circuits; a computation that
/// observed a change in it must not be cached.
#[derive(Debug, Default)]
pub struct InProgress {
    active: RefCell<FxHashSet<GuardKey>>,
    cycles: Cell<u32>,
}

impl InProgress {
    /// Register `key`, or return `None` if it is already in progress.
    pub fn enter(&self, key: GuardKey) -> Option<RecursionGuard<'_>> {
        if !self.active.borrow_mut().insert(key.clone()) {
            self.cycles.set(self.cycles.get() + 1);
            tracing::debug!(?key, "recursion guard short-circuited a cycle");
            return None;
        }
        Some(RecursionGuard { owner: self, key: Some(key) })
    }

    /// Monotonic count of short-circuits in this session.
    pub fn cycles(&self) -> u32 {
        self.cycles.get()
    }

    pub fn is_active(&self, key: &GuardKey) -> bool {
        self.active.borrow().contains(key)
    }
}

/// Releases its key when dropped, on every exit path.
#[derive(Debug)]
pub struct RecursionGuard<'a> {
    owner: &'a InProgress,
    key: Option<GuardKey>,
}

impl Drop for RecursionGuard<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.owner.active.borrow_mut().remove(&key);
        }
    }
}
