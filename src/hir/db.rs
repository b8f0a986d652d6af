//! The workspace database: files, crates, collaborators and caches.
//!
//! Every mutation bumps [`Workspace::version`]; memoized results are stamped
//! with the version they were computed at and are ignored afterwards.
//! Mutations take `&mut self`, so the driver serializes them against
//! queries; queries take `&self` and may run from many threads.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::base::{FileId, TextRange, Vfs};
use crate::syntax::{LocalNodeId, NodeId, NodeKind, SyntaxTree};

use super::cache::Caches;
use super::error::WorkspaceError;
use super::impls::{AliasIndex, ImplIndexStore, ImplKey, MemoryImplStore};
use super::input::{CrateData, CrateGraph, ModuleTopology, PreludeSupplier, ResolveConfig, StdPrelude};
use super::resolve::Resolver;

/// All inputs of one analysis, plus the caches derived from them.
pub struct Workspace {
    vfs: Vfs,
    trees: IndexMap<FileId, Arc<SyntaxTree>>,
    config: Arc<ResolveConfig>,
    crates: CrateGraph,
    topology: Option<Box<dyn ModuleTopology>>,
    prelude: Box<dyn PreludeSupplier>,
    impls: Box<dyn ImplIndexStore>,
    aliases: AliasIndex,
    version: u64,
    pub(crate) caches: Caches,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("files", &self.trees.len())
            .field("crates", &self.crates)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_config(ResolveConfig::default())
    }

    pub fn with_config(config: ResolveConfig) -> Self {
        let config = Arc::new(config);
        Self {
            vfs: Vfs::new(),
            trees: IndexMap::new(),
            crates: CrateGraph::new(config.clone()),
            config,
            topology: None,
            prelude: Box::new(StdPrelude),
            impls: Box::new(MemoryImplStore::default()),
            aliases: AliasIndex::default(),
            version: 0,
            caches: Caches::default(),
        }
    }

    /// Replace the crate graph as the module topology.
    pub fn set_topology(&mut self, topology: Box<dyn ModuleTopology>) {
        self.topology = Some(topology);
        self.bump_version();
    }

    pub fn set_prelude_supplier(&mut self, prelude: Box<dyn PreludeSupplier>) {
        self.prelude = prelude;
        self.bump_version();
    }

    /// Use `store` for the implementation index, indexing every known file
    /// into it.
    pub fn set_impl_store(&mut self, store: Box<dyn ImplIndexStore>) {
        self.impls = store;
        for (&file, tree) in &self.trees {
            for (key, imp) in ImplKey::collect(file, tree) {
                self.impls.insert(key, imp);
            }
        }
        self.bump_version();
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add or replace the tree of the file at `path`.
    pub fn set_file(&mut self, path: &Path, tree: SyntaxTree) -> FileId {
        let file = self.vfs.intern(path);
        self.impls.remove_file(file);
        self.aliases.remove_file(file);
        for (key, imp) in ImplKey::collect(file, &tree) {
            self.impls.insert(key, imp);
        }
        self.aliases.index_file(file, &tree);
        self.trees.insert(file, Arc::new(tree));
        self.bump_version();
        file
    }

    /// Add many files at once; implementation keys are computed in parallel.
    pub fn set_files(&mut self, files: Vec<(std::path::PathBuf, SyntaxTree)>) -> Vec<FileId> {
        let files: Vec<(FileId, SyntaxTree)> = files
            .into_iter()
            .map(|(path, tree)| (self.vfs.intern(&path), tree))
            .collect();

        let keyed: Vec<_> = files
            .par_iter()
            .map(|(file, tree)| ImplKey::collect(*file, tree))
            .collect();

        let mut impl_count = 0;
        let mut ids = Vec::with_capacity(files.len());
        for ((file, tree), keys) in files.into_iter().zip(keyed) {
            self.impls.remove_file(file);
            self.aliases.remove_file(file);
            impl_count += keys.len();
            for (key, imp) in keys {
                self.impls.insert(key, imp);
            }
            self.aliases.index_file(file, &tree);
            self.trees.insert(file, Arc::new(tree));
            ids.push(file);
        }
        self.bump_version();
        tracing::info!(files = ids.len(), impls = impl_count, "indexed implementation blocks");
        ids
    }

    pub fn remove_file(&mut self, file: FileId) -> Result<(), WorkspaceError> {
        if self.trees.shift_remove(&file).is_none() {
            return Err(WorkspaceError::UnknownFile(file));
        }
        self.impls.remove_file(file);
        self.aliases.remove_file(file);
        self.vfs.remove(file);
        self.bump_version();
        Ok(())
    }

    /// Register a crate rooted at an already added file.
    pub fn add_crate(&mut self, name: &str, root: FileId, no_prelude: bool) -> Result<(), WorkspaceError> {
        match self.trees.get(&root).and_then(|tree| tree.kind(tree.root())) {
            None => return Err(WorkspaceError::UnknownFile(root)),
            Some(kind) if !kind.is_module() => return Err(WorkspaceError::NotAModule(NodeId::root(root))),
            Some(_) => {}
        }
        self.crates.insert(name, CrateData { root, no_prelude });
        self.bump_version();
        Ok(())
    }

    /// Invalidate every memoized result.
    pub fn bump_version(&mut self) {
        self.version += 1;
        self.caches.sweep(self.version);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    pub fn crates(&self) -> &CrateGraph {
        &self.crates
    }

    pub fn topology(&self) -> &dyn ModuleTopology {
        match &self.topology {
            Some(topology) => topology.as_ref(),
            None => &self.crates,
        }
    }

    pub fn prelude_supplier(&self) -> &dyn PreludeSupplier {
        self.prelude.as_ref()
    }

    pub fn impl_store(&self) -> &dyn ImplIndexStore {
        self.impls.as_ref()
    }

    pub(crate) fn aliases(&self) -> &AliasIndex {
        &self.aliases
    }

    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.trees.keys().copied()
    }

    pub fn tree(&self, file: FileId) -> Option<&Arc<SyntaxTree>> {
        self.trees.get(&file)
    }

    /// A resolver session over this workspace.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }

    // ========================================================================
    // Node navigation
    // ========================================================================

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.tree(node.file)?.kind(node.local)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.tree(node.file)?.parent(node.local)?;
        Some(NodeId::new(node.file, parent))
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let children: &[LocalNodeId] = match self.tree(node.file) {
            Some(tree) => tree.children(node.local),
            None => &[],
        };
        children.iter().map(move |&local| NodeId::new(node.file, local))
    }

    /// The `index`-th child of `node`.
    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).nth(index)
    }

    pub fn range(&self, node: NodeId) -> Option<TextRange> {
        self.tree(node.file)?.range(node.local)
    }

    /// `node` and its ancestors, innermost first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.kind(node).map(|_| node), move |&n| self.parent(n))
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor.file == node.file
            && self.tree(node.file).is_some_and(|tree| tree.is_ancestor(ancestor.local, node.local))
    }

    /// Whether `node` is `ancestor` or lies inside it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.is_ancestor(ancestor, node)
    }

    /// Whether `node` ends before `pivot` starts.
    pub fn precedes(&self, node: NodeId, pivot: NodeId) -> bool {
        node.file == pivot.file && self.tree(node.file).is_some_and(|tree| tree.precedes(node.local, pivot.local))
    }

    /// Innermost module (file or inline `mod`) containing `node`, itself included.
    pub fn containing_module(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors(node).find(|&n| self.kind(n).is_some_and(NodeKind::is_module))
    }

    /// Every node of `file` whose kind satisfies `pred`.
    pub fn nodes_where<'a>(
        &'a self,
        file: FileId,
        pred: impl Fn(&NodeKind) -> bool + 'a,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.tree(file)
            .into_iter()
            .flat_map(|tree| tree.iter().map(move |local| (tree, local)))
            .filter(move |(tree, local)| tree.kind(*local).is_some_and(&pred))
            .map(move |(_, local)| NodeId::new(file, local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TreeBuilder;

    fn single_struct(name: &str) -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.struct_item(name, |_| {});
        b.finish()
    }

    #[test]
    fn test_mutations_bump_version() {
        let mut db = Workspace::new();
        let v0 = db.version();

        let file = db.set_file(Path::new("/src/lib.rs"), single_struct("A"));
        assert!(db.version() > v0);

        let v1 = db.version();
        db.add_crate("app", file, false).unwrap();
        assert!(db.version() > v1);

        let v2 = db.version();
        db.remove_file(file).unwrap();
        assert!(db.version() > v2);
    }

    #[test]
    fn test_add_crate_requires_known_file() {
        let mut db = Workspace::new();
        let err = db.add_crate("ghost", FileId::new(42), false).unwrap_err();
        assert_eq!(err, WorkspaceError::UnknownFile(FileId::new(42)));
        assert_eq!(db.remove_file(FileId::new(42)), Err(WorkspaceError::UnknownFile(FileId::new(42))));
    }

    #[test]
    fn test_set_files_indexes_all() {
        let mut db = Workspace::new();
        let ids = db.set_files(vec![
            ("/a.rs".into(), single_struct("A")),
            ("/b.rs".into(), single_struct("B")),
        ]);
        assert_eq!(ids.len(), 2);
        assert_eq!(db.files().count(), 2);
        assert_eq!(db.vfs().lookup(Path::new("/b.rs")), Some(ids[1]));
    }

    #[test]
    fn test_navigation() {
        let mut b = TreeBuilder::new();
        let mut field = LocalNodeId::ROOT;
        let module = b.module("m", |b| {
            b.struct_item("S", |b| field = b.field("x", crate::syntax::UnresolvedTy::named("u8")));
        });
        let mut db = Workspace::new();
        let file = db.set_file(Path::new("/lib.rs"), b.finish());

        let field = NodeId::new(file, field);
        let module = NodeId::new(file, module);
        assert_eq!(db.containing_module(field), Some(module));
        assert!(db.is_ancestor(module, field));
        assert!(db.is_within(module, module));
        assert_eq!(db.ancestors(field).count(), 4);
        assert_eq!(db.nodes_where(file, |k| matches!(k, NodeKind::Field { .. })).collect::<Vec<_>>(), vec![field]);
    }
}
