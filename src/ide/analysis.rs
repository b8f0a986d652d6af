//! Analysis host and snapshot.
//!
//! [`AnalysisHost`] owns the [`Workspace`] and applies mutations.
//! [`Analysis`] is a read-only session over the current state; create one
//! per request (or per thread) with [`AnalysisHost::analysis`].

use std::path::Path;

use smol_str::SmolStr;

use crate::base::FileId;
use crate::hir::{
    check_file, Diagnostic, Implementations, QualifiedPath, ResolveConfig, ResolveResult, Resolver, Ty,
    Workspace, WorkspaceError,
};
use crate::syntax::{NodeId, SyntaxTree, UnresolvedTy};

/// Owns the workspace. Mutations take `&mut self`, so they cannot overlap
/// with an [`Analysis`] borrowed from the same host.
#[derive(Debug, Default)]
pub struct AnalysisHost {
    db: Workspace,
}

impl AnalysisHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolveConfig) -> Self {
        Self { db: Workspace::with_config(config) }
    }

    /// Add or replace the tree of a file.
    pub fn set_file(&mut self, path: impl AsRef<Path>, tree: SyntaxTree) -> FileId {
        self.db.set_file(path.as_ref(), tree)
    }

    pub fn remove_file(&mut self, file: FileId) -> Result<(), WorkspaceError> {
        self.db.remove_file(file)
    }

    /// Register a crate rooted at `root`.
    pub fn add_crate(&mut self, name: &str, root: FileId, no_prelude: bool) -> Result<(), WorkspaceError> {
        self.db.add_crate(name, root, no_prelude)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.db
    }

    /// Mutable access for installing collaborators.
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.db
    }

    pub fn analysis(&self) -> Analysis<'_> {
        Analysis { resolver: self.db.resolver() }
    }
}

/// A query session over one workspace state.
#[derive(Debug)]
pub struct Analysis<'db> {
    resolver: Resolver<'db>,
}

impl<'db> Analysis<'db> {
    pub fn db(&self) -> &'db Workspace {
        self.resolver.db()
    }

    pub fn resolver(&self) -> &Resolver<'db> {
        &self.resolver
    }

    pub fn resolve(&self, path: &QualifiedPath, pivot: NodeId) -> ResolveResult {
        self.resolver.resolve(path, pivot)
    }

    /// Parse `text` as a path and resolve it at `pivot`.
    pub fn resolve_text(&self, text: &str, pivot: NodeId) -> ResolveResult {
        match QualifiedPath::parse(text) {
            Some(path) => self.resolver.resolve(&path, pivot),
            None => ResolveResult::Unresolved,
        }
    }

    pub fn resolve_reference(&self, node: NodeId) -> ResolveResult {
        self.resolver.resolve_reference(node)
    }

    /// Declarations visible in `scope` at `pivot`, lazily.
    pub fn declarations_visible_at(
        &self,
        scope: NodeId,
        pivot: Option<NodeId>,
    ) -> impl Iterator<Item = (SmolStr, NodeId)> + '_ {
        self.resolver.declarations_visible_at(scope, pivot)
    }

    /// Every name visible at `pivot`, innermost scope first. Shadowed names
    /// appear once, bound to their innermost declaration.
    pub fn names_in_scope(&self, pivot: NodeId) -> Vec<(SmolStr, NodeId)> {
        let mut names: Vec<(SmolStr, NodeId)> = Vec::new();
        for scope in self.resolver.scope_chain(pivot) {
            for (name, decl) in self.resolver.declarations_visible_at(scope, Some(pivot)) {
                if !names.iter().any(|(seen, _)| *seen == name) {
                    names.push((name, decl));
                }
            }
        }
        names
    }

    pub fn typify(&self, decl: NodeId) -> Ty {
        self.resolver.typify(decl)
    }

    pub fn typify_expr(&self, expr: NodeId) -> Ty {
        self.resolver.typify_expr(expr)
    }

    pub fn resolve_type(&self, ty: &UnresolvedTy, pivot: NodeId) -> Ty {
        self.resolver.resolve_type(ty, pivot)
    }

    pub fn find_implementations_for(&self, ty: &Ty) -> Implementations<'db> {
        self.resolver.find_implementations_for(ty)
    }

    pub fn resolve_method_call(&self, expr: NodeId) -> ResolveResult {
        self.resolver.resolve_method_call(expr)
    }

    pub fn resolve_field_access(&self, expr: NodeId) -> ResolveResult {
        self.resolver.resolve_field_access(expr)
    }

    pub fn resolve_struct_literal_field(&self, field: NodeId) -> ResolveResult {
        self.resolver.resolve_struct_literal_field(field)
    }

    pub fn resolve_mod_decl(&self, decl: NodeId) -> ResolveResult {
        self.resolver.resolve_mod_decl(decl)
    }

    pub fn resolve_extern_crate(&self, item: NodeId) -> ResolveResult {
        self.resolver.resolve_extern_crate(item)
    }

    pub fn diagnostics(&self, file: FileId) -> Vec<Diagnostic> {
        check_file(&self.resolver, file)
    }
}
