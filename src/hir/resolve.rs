//! Name resolution: which declaration does a path denote at a pivot?
//!
//! # Algorithm
//!
//! 1. Leading `self`/`super` runs name an ancestor module directly.
//! 2. `::name` is looked up in the crate root only.
//! 3. A plain `name` is looked up in each scope enclosing the pivot, innermost
//!    first, up to and including the first module.
//! 4. `qualifier::name` resolves the qualifier first; if it denotes a module
//!    or a type, `name` is looked up among that scope's own members.
//!
//! Within one scope, the first priority level holding a match decides: one
//! distinct declaration is [`ResolveResult::Resolved`], more are
//! [`ResolveResult::Ambiguous`].
//!
//! Every query runs inside a [`Resolver`] session that owns the recursion
//! guard. Results are memoized in the workspace, stamped with its version.

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::FileId;
use crate::syntax::{NodeId, NodeKind, PathPart, QualifiedPath, UseKind};

use super::cache::{GuardKey, InProgress, RecursionGuard, VersionedCache};
use super::db::Workspace;
use super::scope::ScopeContext;
use super::ty::Ty;

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Outcome of a resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult {
    /// Exactly one declaration matched.
    Resolved(NodeId),
    /// Nothing matched, or the lookup ran into a cycle.
    Unresolved,
    /// Several equally valid declarations matched. Callers must not pick one.
    Ambiguous(Vec<NodeId>),
}

impl ResolveResult {
    /// Classify a deduplicated candidate list.
    pub fn from_candidates(mut candidates: Vec<NodeId>) -> Self {
        match candidates.len() {
            0 => ResolveResult::Unresolved,
            1 => ResolveResult::Resolved(candidates.remove(0)),
            _ => ResolveResult::Ambiguous(candidates),
        }
    }

    /// The declaration, if unambiguous.
    pub fn single(&self) -> Option<NodeId> {
        match self {
            ResolveResult::Resolved(node) => Some(*node),
            _ => None,
        }
    }

    /// Every candidate: one when resolved, all when ambiguous.
    pub fn candidates(&self) -> &[NodeId] {
        match self {
            ResolveResult::Resolved(node) => std::slice::from_ref(node),
            ResolveResult::Ambiguous(nodes) => nodes,
            ResolveResult::Unresolved => &[],
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolveResult::Resolved(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolveResult::Unresolved)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(_))
    }
}

/// How the leading segments of a path are interpreted.
#[derive(Debug, PartialEq, Eq)]
enum PathClass<'p> {
    /// `self`, `super`, `super::super`: the n-th ancestor module.
    AncestorModule(usize),
    /// `::name`.
    CrateRelative,
    /// `name`.
    Plain,
    /// `qualifier::name`.
    Qualified(&'p QualifiedPath),
    Invalid,
}

fn classify(path: &QualifiedPath, prefixed: bool) -> PathClass<'_> {
    let module_part = match path.part() {
        PathPart::Super => true,
        PathPart::SelfValue => prefixed || path.qualifier().is_some(),
        _ => false,
    };
    if module_part {
        if path.is_rooted() {
            return PathClass::Invalid;
        }
        let segments = path.segments();
        let valid = segments.iter().enumerate().all(|(index, part)| match part {
            PathPart::Super => true,
            PathPart::SelfValue => index == 0,
            _ => false,
        });
        if !valid {
            return PathClass::Invalid;
        }
        let level = segments.iter().filter(|part| matches!(part, PathPart::Super)).count();
        return PathClass::AncestorModule(level);
    }

    match path.qualifier() {
        Some(qualifier) => PathClass::Qualified(qualifier),
        None if path.is_fully_qualified() => PathClass::CrateRelative,
        None => PathClass::Plain,
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// A resolution session over one [`Workspace`] snapshot.
///
/// Sessions are cheap; create one per query or per thread. They are not
/// `Sync`: the recursion guard is per-session state.
pub struct Resolver<'db> {
    db: &'db Workspace,
    in_progress: InProgress,
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").field("version", &self.db.version()).finish_non_exhaustive()
    }
}

impl<'db> Resolver<'db> {
    pub fn new(db: &'db Workspace) -> Self {
        Self { db, in_progress: InProgress::default() }
    }

    pub fn db(&self) -> &'db Workspace {
        self.db
    }

    pub(crate) fn enter(&self, key: GuardKey) -> Option<RecursionGuard<'_>> {
        self.in_progress.enter(key)
    }

    /// Look `key` up in `cache`, or compute it under the recursion guard.
    ///
    /// A re-entrant request for `guard` yields `fallback`. Values computed
    /// while any guard of this session short-circuited depend on what was
    /// in progress and are not cached.
    pub(crate) fn memoized<K, V>(
        &self,
        cache: &VersionedCache<K, V>,
        key: K,
        guard: GuardKey,
        fallback: V,
        compute: impl FnOnce() -> V,
    ) -> V
    where
        K: Eq + std::hash::Hash,
        V: Clone,
    {
        let version = self.db.version();
        if let Some(value) = cache.get(&key, version) {
            return value;
        }
        let Some(_guard) = self.enter(guard) else {
            return fallback;
        };
        let cycles = self.in_progress.cycles();
        let value = compute();
        if self.in_progress.cycles() == cycles {
            cache.insert(key, version, value.clone());
        }
        value
    }

    // ========================================================================
    // Paths
    // ========================================================================

    /// Resolve `path` as written at `pivot`.
    pub fn resolve(&self, path: &QualifiedPath, pivot: NodeId) -> ResolveResult {
        self.resolve_path(path, pivot, false)
    }

    /// `prefixed` is set when `path` is the qualifier of a longer path, where
    /// a leading `self` means the current module rather than the receiver.
    fn resolve_path(&self, path: &QualifiedPath, pivot: NodeId, prefixed: bool) -> ResolveResult {
        let key = (path.clone(), pivot, prefixed);
        self.memoized(
            &self.db.caches.paths,
            key.clone(),
            GuardKey::Path(key),
            ResolveResult::Unresolved,
            || self.compute_path(path, pivot, prefixed),
        )
    }

    fn compute_path(&self, path: &QualifiedPath, pivot: NodeId, prefixed: bool) -> ResolveResult {
        let name = path.part().name();
        match classify(path, prefixed) {
            PathClass::Invalid => ResolveResult::Unresolved,
            PathClass::AncestorModule(level) => {
                self.ancestor_module(pivot, level).map_or(ResolveResult::Unresolved, ResolveResult::Resolved)
            }
            PathClass::CrateRelative => match self.crate_root_of(pivot) {
                Some(root) => self.resolve_in([root], name, &ScopeContext::lexical(Some(pivot))),
                None => ResolveResult::Unresolved,
            },
            PathClass::Plain => {
                let chain = self.scope_chain(pivot);
                self.resolve_in(chain, name, &ScopeContext::lexical(Some(pivot)))
            }
            PathClass::Qualified(qualifier) => {
                let scope = self
                    .resolve_path(qualifier, pivot, true)
                    .single()
                    .and_then(|target| self.member_scope(target));
                match scope {
                    Some(scope) => self.resolve_in([scope], name, &ScopeContext::member(Some(pivot))),
                    None => ResolveResult::Unresolved,
                }
            }
        }
    }

    /// Search `scopes` in order for `name`; the first scope with a match
    /// decides.
    pub(crate) fn resolve_in(
        &self,
        scopes: impl IntoIterator<Item = NodeId>,
        name: &str,
        ctx: &ScopeContext,
    ) -> ResolveResult {
        for scope in scopes {
            tracing::trace!(?scope, name, "searching scope");
            let mut best = None;
            let mut found: Vec<NodeId> = Vec::new();
            for entry in self.scope_entries(scope, ctx.clone()) {
                if best.is_some_and(|best| entry.priority > best) {
                    break;
                }
                if entry.name != name {
                    continue;
                }
                let Some(element) = entry.element() else { continue };
                best.get_or_insert(entry.priority);
                if !found.contains(&element) {
                    found.push(element);
                }
            }
            if found.is_empty() {
                continue;
            }
            let result = ResolveResult::from_candidates(found);
            if let ResolveResult::Ambiguous(candidates) = &result {
                tracing::debug!(name, ?scope, ?candidates, "ambiguous lookup");
            }
            return result;
        }
        ResolveResult::Unresolved
    }

    /// The scope whose members `target::name` looks up, if any.
    fn member_scope(&self, target: NodeId) -> Option<NodeId> {
        match self.db.kind(target)? {
            NodeKind::SourceFile
            | NodeKind::Module { .. }
            | NodeKind::Struct { .. }
            | NodeKind::Enum { .. }
            | NodeKind::Trait { .. } => Some(target),
            NodeKind::TypeAlias { .. } => self.typify(target).as_adt(),
            _ => None,
        }
    }

    // ========================================================================
    // Module tree
    // ========================================================================

    /// The module declaring `module`: the enclosing module of an inline
    /// `mod`, or the module holding the `mod name;` that loads a file.
    /// `None` at crate roots.
    pub fn super_module(&self, module: NodeId) -> Option<NodeId> {
        match self.db.kind(module)? {
            NodeKind::Module { .. } => self.db.parent(module).and_then(|parent| self.db.containing_module(parent)),
            NodeKind::SourceFile => {
                if self.db.topology().is_crate_root(module.file) {
                    return None;
                }
                let decl = *self.declaring_mods().get(&module.file)?;
                self.db.containing_module(decl)
            }
            _ => None,
        }
    }

    /// `level` steps up from the module containing `node`.
    pub fn ancestor_module(&self, node: NodeId, level: usize) -> Option<NodeId> {
        let mut module = self.db.containing_module(node)?;
        for _ in 0..level {
            module = self.super_module(module)?;
        }
        Some(module)
    }

    /// Root module of the crate containing `node`. A file no module
    /// declares is its own root.
    pub fn crate_root_of(&self, node: NodeId) -> Option<NodeId> {
        let mut module = self.db.containing_module(node)?;
        let mut seen = vec![module];
        while let Some(parent) = self.super_module(module) {
            if seen.contains(&parent) {
                break;
            }
            seen.push(parent);
            module = parent;
        }
        Some(module)
    }

    /// File → the `mod name;` declaration that loads it.
    fn declaring_mods(&self) -> Arc<FxHashMap<FileId, NodeId>> {
        let version = self.db.version();
        if let Some(map) = self.db.caches.declaring_mods.get(&(), version) {
            return map;
        }
        let mut map = FxHashMap::default();
        for file in self.db.files() {
            for decl in self.db.nodes_where(file, |kind| matches!(kind, NodeKind::ModDecl { .. })) {
                if let Some(target) = self.resolve_mod_decl(decl).single() {
                    map.entry(target.file).or_insert(decl);
                }
            }
        }
        let map = Arc::new(map);
        self.db.caches.declaring_mods.insert((), version, map.clone());
        map
    }

    /// Directory holding the files of `module`'s child modules.
    fn owned_dir(&self, module: NodeId) -> Option<PathBuf> {
        match self.db.kind(module)? {
            NodeKind::SourceFile => {
                let path = self.db.vfs().path(module.file)?;
                let dir = path.parent()?.to_path_buf();
                let is_index = path
                    .file_name()
                    .is_some_and(|file_name| *file_name == *self.db.config().module_index_file);
                if self.db.topology().is_crate_root(module.file) || is_index {
                    Some(dir)
                } else {
                    Some(dir.join(path.file_stem()?))
                }
            }
            NodeKind::Module { name } => {
                let parent = self.db.parent(module).and_then(|parent| self.db.containing_module(parent))?;
                Some(self.owned_dir(parent)?.join(name.as_str()))
            }
            _ => None,
        }
    }

    /// The file a `mod name;` declaration loads.
    pub fn resolve_mod_decl(&self, decl: NodeId) -> ResolveResult {
        self.memoized(
            &self.db.caches.mod_decls,
            decl,
            GuardKey::ModDecl(decl),
            ResolveResult::Unresolved,
            || {
                let Some(NodeKind::ModDecl { name }) = self.db.kind(decl) else {
                    return ResolveResult::Unresolved;
                };
                let dir = self
                    .db
                    .parent(decl)
                    .and_then(|parent| self.db.containing_module(parent))
                    .and_then(|module| self.owned_dir(module));
                let Some(dir) = dir else {
                    return ResolveResult::Unresolved;
                };
                let found: Vec<NodeId> = self
                    .db
                    .topology()
                    .module_file_candidates(name)
                    .iter()
                    .filter_map(|relative| self.db.vfs().find_relative(&dir, relative))
                    .filter(|&file| self.db.tree(file).is_some())
                    .map(NodeId::root)
                    .collect();
                ResolveResult::from_candidates(found)
            },
        )
    }

    /// The root module of the crate an `extern crate` item names.
    pub fn resolve_extern_crate(&self, item: NodeId) -> ResolveResult {
        let Some(NodeKind::ExternCrate { name, .. }) = self.db.kind(item) else {
            return ResolveResult::Unresolved;
        };
        match self.db.topology().crate_root(name) {
            Some(file) if self.db.tree(file).is_some() => ResolveResult::Resolved(NodeId::root(file)),
            _ => ResolveResult::Unresolved,
        }
    }

    // ========================================================================
    // Imports
    // ========================================================================

    /// Target of a single `use a::b;` / `use a::b as c;`.
    pub fn resolve_use_path(&self, item: NodeId) -> ResolveResult {
        match self.db.kind(item) {
            Some(NodeKind::Use(tree)) => match (&tree.kind, &tree.path) {
                (UseKind::Single { .. }, Some(path)) => self.resolve(path, item),
                _ => ResolveResult::Unresolved,
            },
            _ => ResolveResult::Unresolved,
        }
    }

    /// Module (or type) whose members `use path::*;` imports.
    pub fn resolve_glob_target(&self, item: NodeId) -> ResolveResult {
        let Some(_guard) = self.enter(GuardKey::GlobTarget(item)) else {
            return ResolveResult::Unresolved;
        };
        match self.db.kind(item) {
            Some(NodeKind::Use(tree)) if tree.kind == UseKind::Glob => match &tree.path {
                Some(path) => self.resolve_path(path, item, true),
                None => self.crate_root_of(item).map_or(ResolveResult::Unresolved, ResolveResult::Resolved),
            },
            _ => ResolveResult::Unresolved,
        }
    }

    /// Target of the `index`-th item of `use path::{..};`.
    pub fn resolve_use_group_item(&self, item: NodeId, index: usize) -> ResolveResult {
        let Some(_guard) = self.enter(GuardKey::UseItem(item, index)) else {
            return ResolveResult::Unresolved;
        };
        let Some(NodeKind::Use(tree)) = self.db.kind(item) else {
            return ResolveResult::Unresolved;
        };
        let UseKind::Group(items) = &tree.kind else {
            return ResolveResult::Unresolved;
        };
        let Some(group_item) = items.get(index) else {
            return ResolveResult::Unresolved;
        };

        let base = match &tree.path {
            Some(path) => self.resolve_path(path, item, true).single(),
            None => self.crate_root_of(item),
        };
        let Some(base) = base else {
            return ResolveResult::Unresolved;
        };
        match &group_item.name {
            None => ResolveResult::Resolved(base),
            Some(name) => match self.member_scope(base) {
                Some(scope) => self.resolve_in([scope], name, &ScopeContext::member(Some(item))),
                None => ResolveResult::Unresolved,
            },
        }
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Resolve whatever reference `node` carries.
    pub fn resolve_reference(&self, node: NodeId) -> ResolveResult {
        match self.db.kind(node) {
            Some(NodeKind::PathExpr { path }) | Some(NodeKind::StructLit { path }) => self.resolve(path, node),
            Some(NodeKind::StructLitField { .. }) => self.resolve_struct_literal_field(node),
            Some(NodeKind::FieldExpr { .. }) => self.resolve_field_access(node),
            Some(NodeKind::MethodCall { .. }) => self.resolve_method_call(node),
            Some(NodeKind::ModDecl { .. }) => self.resolve_mod_decl(node),
            Some(NodeKind::ExternCrate { .. }) => self.resolve_extern_crate(node),
            Some(NodeKind::Use(tree)) => match tree.kind {
                UseKind::Single { .. } => self.resolve_use_path(node),
                UseKind::Glob => self.resolve_glob_target(node),
                UseKind::Group(_) => ResolveResult::Unresolved,
            },
            Some(NodeKind::Impl { trait_ref: Some(path), .. }) => self.resolve(path, node),
            _ => ResolveResult::Unresolved,
        }
    }

    /// `Struct { field: .. }` or `Enum::Variant { field: .. }`: the declared
    /// field with that name.
    pub fn resolve_struct_literal_field(&self, field: NodeId) -> ResolveResult {
        let Some(NodeKind::StructLitField { name }) = self.db.kind(field) else {
            return ResolveResult::Unresolved;
        };
        let Some(literal) = self.db.parent(field) else {
            return ResolveResult::Unresolved;
        };
        let Some(NodeKind::StructLit { path }) = self.db.kind(literal) else {
            return ResolveResult::Unresolved;
        };
        let target = self.resolve(path, literal).single();
        let target = match target.and_then(|target| Some((target, self.db.kind(target)?))) {
            Some((target, NodeKind::Struct { .. } | NodeKind::Variant { .. })) => target,
            Some((alias, NodeKind::TypeAlias { .. })) => match self.typify(alias).as_adt() {
                Some(adt) => adt,
                None => return ResolveResult::Unresolved,
            },
            _ => return ResolveResult::Unresolved,
        };
        self.fields_named(target, name)
    }

    /// `receiver.field`: the field of the receiver's type, through any
    /// number of references.
    pub fn resolve_field_access(&self, expr: NodeId) -> ResolveResult {
        let Some(NodeKind::FieldExpr { field }) = self.db.kind(expr) else {
            return ResolveResult::Unresolved;
        };
        let Some(receiver) = self.db.child(expr, 0) else {
            return ResolveResult::Unresolved;
        };
        let receiver_ty = self.typify_expr(receiver);
        match receiver_ty.strip_refs() {
            Ty::Adt(adt) => self.fields_named(*adt, field),
            _ => ResolveResult::Unresolved,
        }
    }

    /// `receiver.method()`: an instance method of the receiver's type, or of
    /// the type behind one reference if the receiver's own type has none.
    pub fn resolve_method_call(&self, expr: NodeId) -> ResolveResult {
        let Some(NodeKind::MethodCall { method }) = self.db.kind(expr) else {
            return ResolveResult::Unresolved;
        };
        let Some(receiver) = self.db.child(expr, 0) else {
            return ResolveResult::Unresolved;
        };
        let receiver_ty = self.typify_expr(receiver);

        let direct = self.methods_named(&receiver_ty, method);
        if !direct.is_empty() {
            return ResolveResult::from_candidates(direct);
        }
        match receiver_ty.deref_once() {
            Some(inner) => ResolveResult::from_candidates(self.methods_named(inner, method)),
            None => ResolveResult::Unresolved,
        }
    }

    /// Instance methods called `name`; inherent ones shadow trait ones.
    fn methods_named(&self, ty: &Ty, name: &str) -> Vec<NodeId> {
        let impls = self.find_implementations_for(ty);
        let methods: Vec<NodeId> = impls
            .instance_methods()
            .filter(|&method| self.db.kind(method).and_then(NodeKind::name).is_some_and(|n| n == name))
            .collect();
        let inherent: Vec<NodeId> = methods
            .iter()
            .copied()
            .filter(|&method| {
                self.db
                    .parent(method)
                    .and_then(|imp| self.db.kind(imp))
                    .is_some_and(|kind| matches!(kind, NodeKind::Impl { trait_ref: None, .. }))
            })
            .collect();
        if inherent.is_empty() { methods } else { inherent }
    }

    fn fields_named(&self, owner: NodeId, name: &str) -> ResolveResult {
        let fields = self
            .db
            .children(owner)
            .filter(|&child| matches!(self.db.kind(child), Some(NodeKind::Field { name: n, .. }) if n == name))
            .collect();
        ResolveResult::from_candidates(fields)
    }

    /// The declaration an impl's `Self` stands for.
    pub(crate) fn impl_self_decl(&self, imp: NodeId) -> Option<NodeId> {
        match self.db.kind(imp)? {
            NodeKind::Impl { target, .. } => self.resolve_type(target, imp).as_adt(),
            _ => None,
        }
    }
}
