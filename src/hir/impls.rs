//! Implementation index: structural lookup of `impl` blocks by target type.
//!
//! Lookup is two-phase. The store is probed with a structural [`ImplKey`]
//! derived from the query type; keys compare hole-aware, so an impl over a
//! type parameter is returned for any query of the same top-level shape.
//! The raw candidates are then narrowed by resolving each impl's target
//! type and comparing it for exact equality with the query.

use std::hash::{Hash, Hasher};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use smol_str::SmolStr;

use crate::base::FileId;
use crate::syntax::{
    NodeId, NodeKind, PathPart, PrimTy, QualifiedPath, SyntaxTree, UnresolvedTy, UseKind,
};

use super::db::Workspace;
use super::resolve::Resolver;
use super::ty::Ty;

// ============================================================================
// KEYS
// ============================================================================

/// Structural shape of an impl target.
///
/// Equality is hole-aware and therefore not transitive: `_` equals both
/// `Foo` and `Bar`. Every `Path` key hashes identically so that holes
/// land in the same bucket as the nominal keys they match.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum ImplKey {
    Path(QualifiedPath),
    Ref { mutable: bool, inner: Box<ImplKey> },
    Tuple(Vec<ImplKey>),
    Fn { params: Vec<ImplKey>, ret: Box<ImplKey> },
    Primitive(PrimTy),
}

impl ImplKey {
    /// A key matching every nominal type.
    pub fn hole() -> Self {
        ImplKey::Path(QualifiedPath::ident(PathPart::Hole))
    }

    /// Key of a written impl target. Single-segment paths naming one of
    /// `type_params` become holes. Slices and `_` are not indexed.
    pub fn from_target(target: &UnresolvedTy, type_params: &[SmolStr]) -> Option<Self> {
        let key = match target {
            UnresolvedTy::Path(path) => match target.single_name() {
                Some(name) if type_params.iter().any(|param| param == name) => ImplKey::hole(),
                _ => ImplKey::Path(path.clone()),
            },
            UnresolvedTy::Ref { inner, mutable } => ImplKey::Ref {
                mutable: *mutable,
                inner: Box::new(Self::from_target(inner, type_params)?),
            },
            UnresolvedTy::Tuple(elements) => ImplKey::Tuple(
                elements
                    .iter()
                    .map(|element| Self::from_target(element, type_params))
                    .collect::<Option<_>>()?,
            ),
            UnresolvedTy::Fn { params, ret } => ImplKey::Fn {
                params: params
                    .iter()
                    .map(|param| Self::from_target(param, type_params))
                    .collect::<Option<_>>()?,
                ret: Box::new(Self::from_target(ret, type_params)?),
            },
            UnresolvedTy::Primitive(prim) => ImplKey::Primitive(*prim),
            UnresolvedTy::Slice(_) | UnresolvedTy::Infer => return None,
        };
        Some(key)
    }

    /// Probe key of a semantic type: the top-level nominal type by its
    /// declared name, nested nominal types as holes.
    pub fn from_ty(ty: &Ty, db: &Workspace) -> Option<Self> {
        Self::shape_of(ty, db, true)
    }

    fn shape_of(ty: &Ty, db: &Workspace, top: bool) -> Option<Self> {
        let key = match ty {
            Ty::Primitive(prim) => ImplKey::Primitive(*prim),
            Ty::Ref { inner, mutable } => ImplKey::Ref {
                mutable: *mutable,
                inner: Box::new(Self::shape_of(inner, db, false)?),
            },
            Ty::Tuple(elements) => ImplKey::Tuple(
                elements
                    .iter()
                    .map(|element| Self::shape_of(element, db, false))
                    .collect::<Option<_>>()?,
            ),
            Ty::Fn { params, ret } => ImplKey::Fn {
                params: params
                    .iter()
                    .map(|param| Self::shape_of(param, db, false))
                    .collect::<Option<_>>()?,
                ret: Box::new(Self::shape_of(ret, db, false)?),
            },
            Ty::Adt(decl) if top => {
                let name = db.kind(*decl)?.name()?;
                ImplKey::Path(QualifiedPath::ident(PathPart::Named(name.clone())))
            }
            Ty::Adt(_) | Ty::Unknown if !top => ImplKey::hole(),
            Ty::Adt(_) | Ty::Unknown => return None,
        };
        Some(key)
    }

    /// Hole-aware structural equality.
    pub fn matches(&self, other: &ImplKey) -> bool {
        match (self, other) {
            (ImplKey::Path(a), ImplKey::Path(b)) => a.matches(b),
            (ImplKey::Ref { mutable: m1, inner: a }, ImplKey::Ref { mutable: m2, inner: b }) => {
                m1 == m2 && a.matches(b)
            }
            (ImplKey::Tuple(a), ImplKey::Tuple(b)) => all_match(a, b),
            (ImplKey::Fn { params: p1, ret: r1 }, ImplKey::Fn { params: p2, ret: r2 }) => {
                all_match(p1, p2) && r1.matches(r2)
            }
            (ImplKey::Primitive(a), ImplKey::Primitive(b)) => a == b,
            _ => false,
        }
    }

    /// Bucket hash, consistent with [`matches`](Self::matches).
    pub fn bucket(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Keys of every impl block in `tree`.
    pub fn collect(file: FileId, tree: &SyntaxTree) -> Vec<(ImplKey, NodeId)> {
        tree.iter()
            .filter_map(|local| {
                let NodeKind::Impl { target, .. } = tree.kind(local)? else {
                    return None;
                };
                let type_params: Vec<SmolStr> = tree
                    .children(local)
                    .iter()
                    .filter_map(|&child| match tree.kind(child) {
                        Some(NodeKind::TypeParam { name }) => Some(name.clone()),
                        _ => None,
                    })
                    .collect();
                let key = Self::from_target(target, &type_params)?;
                Some((key, NodeId::new(file, local)))
            })
            .collect()
    }
}

fn all_match(a: &[ImplKey], b: &[ImplKey]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
}

impl PartialEq for ImplKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Hash for ImplKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            // Paths only hash their shape; holes must collide with names.
            ImplKey::Path(_) => {}
            ImplKey::Ref { mutable, inner } => {
                mutable.hash(state);
                inner.hash(state);
            }
            ImplKey::Tuple(elements) => elements.hash(state),
            ImplKey::Fn { params, ret } => {
                params.hash(state);
                ret.hash(state);
            }
            ImplKey::Primitive(prim) => prim.hash(state),
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Key → impl multimap.
///
/// Implementations must honor [`ImplKey::matches`] for lookups and
/// [`ImplKey::bucket`] for hashing. Insert and probe are atomic.
pub trait ImplIndexStore: Send + Sync {
    fn insert(&self, key: ImplKey, imp: NodeId);

    /// Every impl whose key matches `key`.
    fn probe(&self, key: &ImplKey) -> Vec<NodeId>;

    /// Drop every impl declared in `file`.
    fn remove_file(&self, file: FileId);

    fn entries(&self) -> Vec<(ImplKey, NodeId)>;
}

/// In-memory store, bucketed by [`ImplKey::bucket`].
#[derive(Debug, Default)]
pub struct MemoryImplStore {
    buckets: RwLock<FxHashMap<u64, Vec<(ImplKey, NodeId)>>>,
}

impl MemoryImplStore {
    pub fn len(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImplIndexStore for MemoryImplStore {
    fn insert(&self, key: ImplKey, imp: NodeId) {
        self.buckets.write().entry(key.bucket()).or_default().push((key, imp));
    }

    fn probe(&self, key: &ImplKey) -> Vec<NodeId> {
        let buckets = self.buckets.read();
        let Some(bucket) = buckets.get(&key.bucket()) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter(|(candidate, _)| candidate.matches(key))
            .map(|&(_, imp)| imp)
            .collect()
    }

    fn remove_file(&self, file: FileId) {
        let mut buckets = self.buckets.write();
        for bucket in buckets.values_mut() {
            bucket.retain(|(_, imp)| imp.file != file);
        }
        buckets.retain(|_, bucket| !bucket.is_empty());
    }

    fn entries(&self) -> Vec<(ImplKey, NodeId)> {
        let mut entries: Vec<_> = self.buckets.read().values().flatten().cloned().collect();
        entries.sort_by_key(|&(_, imp)| imp);
        entries
    }
}

// ============================================================================
// ALIASES
// ============================================================================

/// Names a type is re-exported under: `use a::Foo as Bar;` and
/// `type Bar = a::Foo;` both record `Foo → Bar`.
#[derive(Debug, Default)]
pub struct AliasIndex {
    by_file: FxHashMap<FileId, Vec<(SmolStr, SmolStr)>>,
}

impl AliasIndex {
    pub fn index_file(&mut self, file: FileId, tree: &SyntaxTree) {
        let mut pairs = Vec::new();
        for local in tree.iter() {
            match tree.kind(local) {
                Some(NodeKind::Use(use_tree)) => {
                    let base = use_tree.path.as_ref().map(|path| path.part().name());
                    match &use_tree.kind {
                        UseKind::Single { alias: Some(alias) } => {
                            if let Some(base) = base {
                                pairs.push((SmolStr::new(base), alias.clone()));
                            }
                        }
                        UseKind::Group(items) => {
                            for item in items {
                                let original = item.name.as_deref().or(base);
                                if let (Some(original), Some(alias)) = (original, &item.alias) {
                                    pairs.push((SmolStr::new(original), alias.clone()));
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Some(NodeKind::TypeAlias { name, ty: UnresolvedTy::Path(path) }) => {
                    pairs.push((SmolStr::new(path.part().name()), name.clone()));
                }
                _ => {}
            }
        }
        if !pairs.is_empty() {
            self.by_file.insert(file, pairs);
        }
    }

    pub fn remove_file(&mut self, file: FileId) {
        self.by_file.remove(&file);
    }

    /// Every alias of `name`, followed transitively.
    pub fn aliases_of(&self, name: &str) -> Vec<SmolStr> {
        let mut found: Vec<SmolStr> = Vec::new();
        let mut queue = vec![SmolStr::new(name)];
        while let Some(current) = queue.pop() {
            for (original, alias) in self.by_file.values().flatten() {
                if *original == current && alias != name && !found.contains(alias) {
                    found.push(alias.clone());
                    queue.push(alias.clone());
                }
            }
        }
        found
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// The impl blocks of one type, after exact filtering.
#[derive(Clone, Debug)]
pub struct Implementations<'db> {
    db: &'db Workspace,
    impls: Vec<NodeId>,
}

impl<'db> Implementations<'db> {
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.impls.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.impls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impls.is_empty()
    }

    /// Impls without a trait reference.
    pub fn inherent(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|&imp| matches!(self.db.kind(imp), Some(NodeKind::Impl { trait_ref: None, .. })))
    }

    pub fn trait_impls(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|&imp| matches!(self.db.kind(imp), Some(NodeKind::Impl { trait_ref: Some(_), .. })))
    }

    /// Associated functions of every impl, inherent impls first.
    pub fn methods(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inherent()
            .chain(self.trait_impls())
            .flat_map(|imp| self.db.children(imp))
            .filter(|&item| matches!(self.db.kind(item), Some(NodeKind::Function { .. })))
    }

    /// Associated functions without a receiver.
    pub fn static_methods(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.methods().filter(|&method| !has_receiver(self.db, method))
    }

    /// Associated functions with a receiver.
    pub fn instance_methods(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.methods().filter(|&method| has_receiver(self.db, method))
    }
}

fn has_receiver(db: &Workspace, function: NodeId) -> bool {
    db.children(function).any(|child| matches!(db.kind(child), Some(NodeKind::SelfParam { .. })))
}

impl<'db> Resolver<'db> {
    /// The structural probe alone: every impl whose key matches the key of
    /// `ty` (or of one of its aliases), before exact filtering.
    pub fn probe_impls(&self, ty: &Ty) -> Vec<NodeId> {
        let db = self.db();
        let Some(key) = ImplKey::from_ty(ty, db) else {
            return Vec::new();
        };

        let mut keys = vec![key];
        if let Some(name) = ty.as_adt().and_then(|decl| db.kind(decl)?.name().cloned()) {
            keys.extend(
                db.aliases()
                    .aliases_of(&name)
                    .into_iter()
                    .map(|alias| ImplKey::Path(QualifiedPath::ident(PathPart::Named(alias)))),
            );
        }

        let mut found = Vec::new();
        for key in &keys {
            for imp in db.impl_store().probe(key) {
                if !found.contains(&imp) {
                    found.push(imp);
                }
            }
        }
        found
    }

    /// Impl blocks whose resolved target type equals `ty`.
    pub fn find_implementations_for(&self, ty: &Ty) -> Implementations<'db> {
        let raw = self.probe_impls(ty);
        let raw_count = raw.len();
        let impls: Vec<NodeId> = raw.into_iter().filter(|&imp| self.impl_target_ty(imp) == *ty).collect();
        tracing::trace!(
            ty = %ty.display(self.db()),
            raw = raw_count,
            filtered = impls.len(),
            "implementation index probe"
        );
        Implementations { db: self.db(), impls }
    }

    /// The resolved target type of an impl block.
    pub fn impl_target_ty(&self, imp: NodeId) -> Ty {
        match self.db().kind(imp) {
            Some(NodeKind::Impl { target, .. }) => self.resolve_type(target, imp),
            _ => Ty::Unknown,
        }
    }
}
