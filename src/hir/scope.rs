//! Scope enumeration: the names each kind of scope node makes visible.
//!
//! A scope yields a lazy stream of [`ScopeEntry`]s in priority order. The
//! stream is cheap to re-create from `(scope, context)` and the element of
//! each entry is only resolved when a consumer asks for it, so lookups stop
//! at the first matching priority level without resolving the rest of the
//! scope (glob and prelude expansion in particular).

use std::fmt;
use std::iter;

use once_cell::unsync::Lazy;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::syntax::{LocalNodeId, NodeId, NodeKind, UseKind};

use super::resolve::Resolver;
use super::ty::Ty;

// ============================================================================
// PRIORITY
// ============================================================================

/// Lookup priority within one scope; lower is preferred.
///
/// Everything a glob import brings in shares the single [`tiers::GLOB`]
/// level, whatever rank it has in the glob's target, and likewise for the
/// prelude. Two globs exporting the same name are therefore ambiguous
/// regardless of how either target declares it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u16);

impl Priority {
    pub const fn tier(tier: u16) -> Self {
        Priority(tier)
    }

    pub fn level(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}

/// Tiers of module-level entries, in lookup order.
pub mod tiers {
    pub const INJECTED_CRATE: u16 = 1;
    pub const MOD_DECL: u16 = 2;
    pub const ITEM: u16 = 3;
    pub const FOREIGN_ITEM: u16 = 4;
    pub const EXTERN_CRATE: u16 = 5;
    pub const USE: u16 = 6;
    pub const GLOB: u16 = 7;
    pub const PRELUDE: u16 = 8;
}

// ============================================================================
// ENTRIES
// ============================================================================

type Thunk<'a> = Box<dyn FnOnce() -> Option<NodeId> + 'a>;

/// A name bound to a lazily resolved declaration.
pub struct ScopeEntry<'a> {
    pub name: SmolStr,
    pub priority: Priority,
    element: Lazy<Option<NodeId>, Thunk<'a>>,
}

impl<'a> ScopeEntry<'a> {
    pub fn new(name: SmolStr, priority: Priority, element: NodeId) -> Self {
        Self::lazy(name, priority, move || Some(element))
    }

    pub fn lazy(name: SmolStr, priority: Priority, f: impl FnOnce() -> Option<NodeId> + 'a) -> Self {
        Self { name, priority, element: Lazy::new(Box::new(f)) }
    }

    /// The declaration, resolved on first access.
    pub fn element(&self) -> Option<NodeId> {
        *Lazy::force(&self.element)
    }

}

impl fmt::Debug for ScopeEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A lazy stream of entries.
pub type Entries<'a> = Box<dyn Iterator<Item = ScopeEntry<'a>> + 'a>;

fn empty<'a>() -> Entries<'a> {
    Box::new(iter::empty())
}

/// Entries produced by `f`, which only runs when the stream is pulled past
/// a nameless marker at `floor`. Every entry of `f` must rank at or after
/// `floor`, so a consumer that stops at the marker never runs `f`.
fn deferred<'a>(floor: Priority, f: impl FnOnce() -> Entries<'a> + 'a) -> Entries<'a> {
    let marker = ScopeEntry::lazy(SmolStr::default(), floor, || None);
    Box::new(iter::once(marker).chain(iter::once_with(f).flatten()))
}

/// What a module exports to a glob import of it: for each name, only the
/// entries at the best priority the module itself binds it at, all
/// re-ranked to `priority`. Elements stay unresolved.
fn exports<'a>(entries: Entries<'a>, priority: Priority) -> Entries<'a> {
    let entries: Vec<ScopeEntry<'a>> = entries.filter(|entry| !entry.name.is_empty()).collect();
    let mut best: FxHashMap<SmolStr, Priority> = FxHashMap::default();
    for entry in &entries {
        best.entry(entry.name.clone())
            .and_modify(|current| *current = (*current).min(entry.priority))
            .or_insert(entry.priority);
    }
    Box::new(
        entries
            .into_iter()
            .filter(move |entry| best.get(&entry.name) == Some(&entry.priority))
            .map(move |mut entry| {
                entry.priority = priority;
                entry
            }),
    )
}

/// Where and how a scope is being enumerated.
#[derive(Clone, Debug, Default)]
pub struct ScopeContext {
    /// The node visibility is evaluated at; `None` sees everything.
    pub pivot: Option<NodeId>,
    /// Lexical lookups also see the injected crates and the prelude;
    /// member lookups (`a::b`, glob targets) only see what a module declares.
    pub lexical: bool,
    /// Set while enumerating the prelude itself.
    pub in_prelude: bool,
    /// Glob imports already being expanded.
    pub visited_globs: Vec<NodeId>,
}

impl ScopeContext {
    pub fn lexical(pivot: Option<NodeId>) -> Self {
        Self { pivot, lexical: true, ..Self::default() }
    }

    pub fn member(pivot: Option<NodeId>) -> Self {
        Self { pivot, lexical: false, ..Self::default() }
    }

    fn imported(&self, glob: Option<NodeId>, in_prelude: bool) -> Self {
        let mut visited_globs = self.visited_globs.clone();
        visited_globs.extend(glob);
        Self { pivot: None, lexical: false, in_prelude, visited_globs }
    }
}

// ============================================================================
// ENUMERATION
// ============================================================================

impl<'db> Resolver<'db> {
    /// Every entry `scope` contributes under `ctx`, in priority order.
    pub fn scope_entries<'r>(&'r self, scope: NodeId, ctx: ScopeContext) -> Entries<'r> {
        let db = self.db();
        let Some(kind) = db.kind(scope) else {
            return empty();
        };
        let local = ctx.pivot.is_some_and(|pivot| db.is_within(pivot, scope));

        match kind {
            NodeKind::SourceFile | NodeKind::Module { .. } => self.module_entries(scope, ctx),
            NodeKind::Block => self.block_entries(scope, ctx.pivot),
            NodeKind::Function { .. } if local => self.function_entries(scope),
            NodeKind::Struct { .. } | NodeKind::Trait { .. } if local => self.generic_entries(scope, Some(scope)),
            NodeKind::Enum { .. } if local => self.generic_entries(scope, Some(scope)),
            NodeKind::TypeAlias { .. } if local => self.generic_entries(scope, None),
            NodeKind::Impl { .. } if local => self.impl_entries(scope),
            NodeKind::Struct { .. } => self.static_method_entries(scope, Priority::tier(1)),
            NodeKind::Enum { .. } => {
                let variants = self.children_named(scope, Priority::tier(1), |kind| {
                    matches!(kind, NodeKind::Variant { .. })
                });
                Box::new(variants.chain(self.static_method_entries(scope, Priority::tier(2))))
            }
            NodeKind::Trait { .. } => Box::new(self.children_named(scope, Priority::tier(1), |kind| {
                matches!(kind, NodeKind::Function { .. } | NodeKind::Const { .. })
            })),
            NodeKind::For | NodeKind::IfLet | NodeKind::WhileLet => {
                // Pattern, then scrutinee or iterable, then the body.
                self.pattern_entries_if_within(scope, ctx.pivot, 0, |index| index == 2)
            }
            NodeKind::MatchArm => self.pattern_entries_if_within(scope, ctx.pivot, 0, |index| index >= 1),
            NodeKind::Closure => {
                let count = db.children(scope).count();
                let Some(body) = count.checked_sub(1) else {
                    return empty();
                };
                let within_body =
                    ctx.pivot.zip(db.child(scope, body)).is_some_and(|(pivot, body)| db.is_within(pivot, body));
                if !within_body {
                    return empty();
                }
                let entries: Vec<_> = db
                    .children(scope)
                    .take(body)
                    .flat_map(|param| self.bindings(param))
                    .map(|binding| self.binding_entry(binding, Priority::tier(1)))
                    .collect();
                Box::new(entries.into_iter())
            }
            _ => empty(),
        }
    }

    /// The lexical scopes enclosing `pivot`, innermost first, ending with
    /// the first module.
    pub fn scope_chain(&self, pivot: NodeId) -> Vec<NodeId> {
        let db = self.db();
        let mut chain = Vec::new();
        for node in db.ancestors(pivot) {
            let Some(kind) = db.kind(node) else { break };
            if kind.is_scope() {
                chain.push(node);
                if kind.is_module() {
                    break;
                }
            }
        }
        chain
    }

    /// `(name, declaration)` pairs visible in `scope` at `pivot`, resolved
    /// lazily as the iterator advances. Entries that resolve to nothing are
    /// skipped.
    pub fn declarations_visible_at<'r>(
        &'r self,
        scope: NodeId,
        pivot: Option<NodeId>,
    ) -> impl Iterator<Item = (SmolStr, NodeId)> + 'r {
        self.scope_entries(scope, ScopeContext::lexical(pivot))
            .filter_map(|entry| entry.element().map(|element| (entry.name.clone(), element)))
    }

    // ------------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------------

    fn module_entries<'r>(&'r self, module: NodeId, ctx: ScopeContext) -> Entries<'r> {
        let db = self.db();
        let mut entries = Vec::new();
        let mut globs = Vec::new();

        if ctx.lexical && module.local == LocalNodeId::ROOT && db.topology().is_crate_root(module.file) {
            for name in &db.config().injected_crates {
                let krate = name.clone();
                entries.push(ScopeEntry::lazy(name.clone(), Priority::tier(tiers::INJECTED_CRATE), move || {
                    let file = db.topology().crate_root(&krate)?;
                    db.tree(file).map(|_| NodeId::root(file))
                }));
            }
        }

        for child in db.children(module) {
            let Some(kind) = db.kind(child) else { continue };
            match kind {
                NodeKind::ModDecl { name } => {
                    entries.push(ScopeEntry::lazy(name.clone(), Priority::tier(tiers::MOD_DECL), move || {
                        self.resolve_mod_decl(child).single()
                    }));
                }
                NodeKind::Module { name } => {
                    entries.push(ScopeEntry::new(name.clone(), Priority::tier(tiers::MOD_DECL), child));
                }
                NodeKind::ForeignBlock => {
                    for item in db.children(child) {
                        if let Some(name) = db
                            .kind(item)
                            .filter(|kind| matches!(kind, NodeKind::Function { .. } | NodeKind::Static { .. }))
                            .and_then(NodeKind::name)
                        {
                            entries.push(ScopeEntry::new(name.clone(), Priority::tier(tiers::FOREIGN_ITEM), item));
                        }
                    }
                }
                NodeKind::ExternCrate { name, alias } => {
                    let binding = alias.clone().unwrap_or_else(|| name.clone());
                    entries.push(ScopeEntry::lazy(binding, Priority::tier(tiers::EXTERN_CRATE), move || {
                        self.resolve_extern_crate(child).single()
                    }));
                }
                NodeKind::Use(tree) => match &tree.kind {
                    UseKind::Single { alias } => {
                        let binding = alias.clone().or_else(|| {
                            tree.path.as_ref().and_then(|path| path.part().name_if_named()).map(SmolStr::new)
                        });
                        if let Some(binding) = binding {
                            entries.push(ScopeEntry::lazy(binding, Priority::tier(tiers::USE), move || {
                                self.resolve_use_path(child).single()
                            }));
                        }
                    }
                    UseKind::Group(items) => {
                        let base = tree.path.as_ref().and_then(|path| path.part().name_if_named());
                        for (index, item) in items.iter().enumerate() {
                            if let Some(binding) = item.binding(base) {
                                entries.push(ScopeEntry::lazy(binding, Priority::tier(tiers::USE), move || {
                                    self.resolve_use_group_item(child, index).single()
                                }));
                            }
                        }
                    }
                    UseKind::Glob => globs.push(child),
                },
                kind if kind.is_named_item() => {
                    if let Some(name) = kind.name() {
                        entries.push(ScopeEntry::new(name.clone(), Priority::tier(tiers::ITEM), child));
                    }
                }
                _ => {}
            }
        }
        entries.sort_by_key(|entry| entry.priority);

        let mut stream: Entries<'r> = Box::new(entries.into_iter());
        for glob in globs {
            if ctx.visited_globs.contains(&glob) {
                tracing::debug!(?glob, "glob import already being expanded");
                continue;
            }
            let inner = ctx.imported(Some(glob), ctx.in_prelude);
            stream = Box::new(stream.chain(deferred(Priority::tier(tiers::GLOB), move || {
                let Some(target) = self.resolve_glob_target(glob).single() else {
                    return empty();
                };
                exports(self.scope_entries(target, inner), Priority::tier(tiers::GLOB))
            })));
        }

        if ctx.lexical && !ctx.in_prelude {
            let inner = ctx.imported(None, true);
            stream = Box::new(stream.chain(deferred(Priority::tier(tiers::PRELUDE), move || {
                let prelude = self
                    .crate_root_of(module)
                    .and_then(|root| db.prelude_supplier().prelude_for(db, root))
                    .filter(|prelude| prelude.file != module.file);
                let Some(prelude) = prelude else {
                    return empty();
                };
                exports(self.scope_entries(prelude, inner), Priority::tier(tiers::PRELUDE))
            })));
        }

        stream
    }

    // ------------------------------------------------------------------------
    // Blocks and functions
    // ------------------------------------------------------------------------

    fn block_entries<'r>(&'r self, block: NodeId, pivot: Option<NodeId>) -> Entries<'r> {
        let db = self.db();
        let lets: Vec<NodeId> =
            db.children(block).filter(|&child| matches!(db.kind(child), Some(NodeKind::Let { .. }))).collect();

        // Nearest first. Bindings declared after the pivot are not yet in
        // scope, and neither is the one whose statement contains it.
        let visible: Vec<NodeId> = match pivot {
            None => lets.into_iter().rev().collect(),
            Some(pivot) => {
                let mut rest = lets
                    .into_iter()
                    .rev()
                    .skip_while(|&stmt| !db.precedes(stmt, pivot) && !db.is_ancestor(stmt, pivot))
                    .peekable();
                if rest.peek().is_some_and(|&stmt| db.is_ancestor(stmt, pivot)) {
                    rest.next();
                }
                rest.collect()
            }
        };

        let mut entries = Vec::new();
        for (index, stmt) in visible.iter().enumerate() {
            let priority = Priority::tier(u16::try_from(index + 1).unwrap_or(u16::MAX - 1));
            for binding in db.child(*stmt, 0).map(|pat| self.bindings(pat)).unwrap_or_default() {
                entries.push(self.binding_entry(binding, priority));
            }
        }

        let item_tier = u16::try_from(visible.len() + 1).unwrap_or(u16::MAX);
        entries.extend(self.children_named(block, Priority::tier(item_tier), NodeKind::is_named_item));
        Box::new(entries.into_iter())
    }

    fn function_entries<'r>(&'r self, function: NodeId) -> Entries<'r> {
        let db = self.db();
        let mut entries = Vec::new();
        for child in db.children(function) {
            match db.kind(child) {
                Some(NodeKind::SelfParam { .. }) => {
                    entries.push(ScopeEntry::new(SmolStr::new_static("self"), Priority::tier(1), child));
                }
                Some(NodeKind::Param { .. }) => {
                    for binding in db.child(child, 0).map(|pat| self.bindings(pat)).unwrap_or_default() {
                        entries.push(self.binding_entry(binding, Priority::tier(1)));
                    }
                }
                _ => {}
            }
        }
        entries.extend(self.children_named(function, Priority::tier(2), |kind| {
            matches!(kind, NodeKind::TypeParam { .. })
        }));
        Box::new(entries.into_iter())
    }

    fn pattern_entries_if_within<'r>(
        &'r self,
        scope: NodeId,
        pivot: Option<NodeId>,
        pattern: usize,
        in_body: impl Fn(usize) -> bool,
    ) -> Entries<'r> {
        let db = self.db();
        let Some(pivot) = pivot else {
            return empty();
        };
        let within = db
            .children(scope)
            .enumerate()
            .any(|(index, child)| in_body(index) && db.is_within(pivot, child));
        if !within {
            return empty();
        }
        let entries: Vec<_> = db
            .child(scope, pattern)
            .map(|pat| self.bindings(pat))
            .unwrap_or_default()
            .into_iter()
            .map(|binding| self.binding_entry(binding, Priority::tier(1)))
            .collect();
        Box::new(entries.into_iter())
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    /// Type parameters, then `Self` bound to `self_decl`.
    fn generic_entries<'r>(&'r self, decl: NodeId, self_decl: Option<NodeId>) -> Entries<'r> {
        let params = self.children_named(decl, Priority::tier(1), |kind| matches!(kind, NodeKind::TypeParam { .. }));
        let self_entry = self_decl.map(|target| ScopeEntry::new(SmolStr::new_static("Self"), Priority::tier(2), target));
        Box::new(params.chain(self_entry))
    }

    fn impl_entries<'r>(&'r self, imp: NodeId) -> Entries<'r> {
        let params = self.children_named(imp, Priority::tier(1), |kind| matches!(kind, NodeKind::TypeParam { .. }));
        let self_entry =
            ScopeEntry::lazy(SmolStr::new_static("Self"), Priority::tier(2), move || self.impl_self_decl(imp));
        Box::new(params.chain(iter::once(self_entry)))
    }

    /// Associated functions without a receiver, from every impl of `adt`.
    fn static_method_entries<'r>(&'r self, adt: NodeId, priority: Priority) -> Entries<'r> {
        deferred(priority, move || {
            let db = self.db();
            let impls = self.find_implementations_for(&Ty::Adt(adt));
            let entries: Vec<_> = impls
                .static_methods()
                .filter_map(|method| {
                    let name = db.kind(method)?.name()?.clone();
                    Some(ScopeEntry::new(name, priority, method))
                })
                .collect();
            let entries: Entries<'r> = Box::new(entries.into_iter());
            entries
        })
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn children_named<'r>(
        &'r self,
        parent: NodeId,
        priority: Priority,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> iter::Flatten<std::vec::IntoIter<Option<ScopeEntry<'r>>>> {
        let db = self.db();
        let entries: Vec<Option<ScopeEntry<'r>>> = db
            .children(parent)
            .map(|child| {
                let kind = db.kind(child).filter(|kind| pred(*kind))?;
                Some(ScopeEntry::new(kind.name()?.clone(), priority, child))
            })
            .collect();
        entries.into_iter().flatten()
    }

    fn binding_entry<'r>(&'r self, binding: NodeId, priority: Priority) -> ScopeEntry<'r> {
        let name = self.db().kind(binding).and_then(NodeKind::name).cloned().unwrap_or_default();
        ScopeEntry::new(name, priority, binding)
    }

    /// Binding patterns nested in `pattern`.
    pub(crate) fn bindings(&self, pattern: NodeId) -> Vec<NodeId> {
        match self.db().tree(pattern.file) {
            Some(tree) => tree.bindings(pattern.local).into_iter().map(|local| NodeId::new(pattern.file, local)).collect(),
            None => Vec::new(),
        }
    }
}
