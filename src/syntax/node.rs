//! Arena syntax tree consumed by the resolver.
//!
//! The tree is deliberately coarse: each node carries the handful of
//! attributes name resolution needs (names, written types, paths), and its
//! children carry the rest. Ranges are only used for ordering ("does this
//! binding precede the pivot?") and for diagnostics.

use smol_str::SmolStr;

use super::ids::LocalNodeId;
use super::path::QualifiedPath;
use super::type_ref::{FloatTy, IntTy, UnresolvedTy};
use crate::base::TextRange;

/// The contents of a `use` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UseTree {
    /// `a::b` in `use a::b::*`; `None` for `use ::{x}` and `use {x}`.
    pub path: Option<QualifiedPath>,
    pub kind: UseKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UseKind {
    /// `use a::b;` / `use a::b as c;`
    Single { alias: Option<SmolStr> },
    /// `use a::*;`
    Glob,
    /// `use a::{self, b as c};`
    Group(Vec<UseGroupItem>),
}

/// One item of a brace group. A `name` of `None` stands for `self`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UseGroupItem {
    pub name: Option<SmolStr>,
    pub alias: Option<SmolStr>,
}

impl UseGroupItem {
    /// The name the item binds under, if any.
    pub fn binding(&self, base_name: Option<&str>) -> Option<SmolStr> {
        match (&self.alias, &self.name) {
            (Some(alias), _) => Some(alias.clone()),
            (None, Some(name)) => Some(name.clone()),
            (None, None) => base_name.map(SmolStr::new),
        }
    }
}

/// Literal expressions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Int { suffix: Option<IntTy> },
    Float { suffix: Option<FloatTy> },
    Bool,
    Char,
    Str,
}

/// Every kind of node the resolver understands.
///
/// Child layout is fixed per kind; the comment on each variant lists it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A file; items.
    SourceFile,
    /// `mod name { .. }`; items.
    Module { name: SmolStr },
    /// `mod name;`; no children.
    ModDecl { name: SmolStr },
    /// `fn name(..) -> ret`; self param, params, type params, optional body block.
    Function { name: SmolStr, ret: Option<UnresolvedTy> },
    /// `self`, `&self`, `&mut self`.
    SelfParam { reference: bool, mutable: bool },
    /// `pat: ty`; one pattern child.
    Param { ty: UnresolvedTy },
    TypeParam { name: SmolStr },
    /// Type params, fields.
    Struct { name: SmolStr },
    /// Type params, variants.
    Enum { name: SmolStr },
    /// Fields.
    Variant { name: SmolStr },
    Field { name: SmolStr, ty: UnresolvedTy },
    /// Type params, associated items.
    Trait { name: SmolStr },
    /// `impl Trait for Target`; type params, associated items.
    Impl { trait_ref: Option<QualifiedPath>, target: UnresolvedTy },
    /// Type params.
    TypeAlias { name: SmolStr, ty: UnresolvedTy },
    Const { name: SmolStr, ty: UnresolvedTy },
    Static { name: SmolStr, ty: UnresolvedTy },
    /// `extern { .. }`; functions and statics.
    ForeignBlock,
    ExternCrate { name: SmolStr, alias: Option<SmolStr> },
    Use(UseTree),
    /// Statements, items and an optional tail expression.
    Block,
    /// Pattern, optional initializer.
    Let { ty: Option<UnresolvedTy> },
    BindingPat { name: SmolStr, mutable: bool },
    /// Nested patterns.
    TuplePat,
    WildcardPat,
    PathExpr { path: QualifiedPath },
    Literal(Literal),
    /// Receiver.
    FieldExpr { field: SmolStr },
    /// Receiver, arguments.
    MethodCall { method: SmolStr },
    /// Callee, arguments.
    Call,
    /// Field initializers.
    StructLit { path: QualifiedPath },
    /// Optional value expression.
    StructLitField { name: SmolStr },
    /// Operand.
    RefExpr { mutable: bool },
    /// Elements.
    TupleExpr,
    /// Pattern, scrutinee, then block, optional else.
    IfLet,
    /// Pattern, scrutinee, body.
    WhileLet,
    /// Pattern, iterable, body.
    For,
    /// Scrutinee, arms.
    Match,
    /// Pattern, body.
    MatchArm,
    /// Parameter patterns, body.
    Closure,
}

impl NodeKind {
    /// The declared name of a named declaration.
    pub fn name(&self) -> Option<&SmolStr> {
        match self {
            NodeKind::Module { name }
            | NodeKind::ModDecl { name }
            | NodeKind::Function { name, .. }
            | NodeKind::TypeParam { name }
            | NodeKind::Struct { name }
            | NodeKind::Enum { name }
            | NodeKind::Variant { name }
            | NodeKind::Field { name, .. }
            | NodeKind::Trait { name }
            | NodeKind::TypeAlias { name, .. }
            | NodeKind::Const { name, .. }
            | NodeKind::Static { name, .. }
            | NodeKind::BindingPat { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Modules: files and inline `mod { }` bodies.
    pub fn is_module(&self) -> bool {
        matches!(self, NodeKind::SourceFile | NodeKind::Module { .. })
    }

    /// Nodes that can contribute bindings to a lexical scope chain.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::SourceFile
                | NodeKind::Module { .. }
                | NodeKind::Block
                | NodeKind::Function { .. }
                | NodeKind::Struct { .. }
                | NodeKind::Enum { .. }
                | NodeKind::Trait { .. }
                | NodeKind::Impl { .. }
                | NodeKind::TypeAlias { .. }
                | NodeKind::For
                | NodeKind::MatchArm
                | NodeKind::Closure
                | NodeKind::IfLet
                | NodeKind::WhileLet
        )
    }

    /// Items that a module or block declares by name.
    pub fn is_named_item(&self) -> bool {
        matches!(
            self,
            NodeKind::Module { .. }
                | NodeKind::Function { .. }
                | NodeKind::Struct { .. }
                | NodeKind::Enum { .. }
                | NodeKind::Trait { .. }
                | NodeKind::TypeAlias { .. }
                | NodeKind::Const { .. }
                | NodeKind::Static { .. }
        )
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, NodeKind::BindingPat { .. } | NodeKind::TuplePat | NodeKind::WildcardPat)
    }

    pub fn is_expr(&self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::PathExpr { .. }
                | NodeKind::Literal(_)
                | NodeKind::FieldExpr { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::Call
                | NodeKind::StructLit { .. }
                | NodeKind::RefExpr { .. }
                | NodeKind::TupleExpr
                | NodeKind::IfLet
                | NodeKind::WhileLet
                | NodeKind::For
                | NodeKind::Match
                | NodeKind::Closure
        )
    }
}

/// One node in a [`SyntaxTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<LocalNodeId>,
    pub children: Vec<LocalNodeId>,
    pub range: TextRange,
}

/// An immutable, parsed file.
///
/// Node 0 is the [`NodeKind::SourceFile`] root. Trees are produced by
/// [`TreeBuilder`](super::TreeBuilder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxTree {
    pub(super) nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn root(&self) -> LocalNodeId {
        LocalNodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: LocalNodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: LocalNodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn parent(&self, id: LocalNodeId) -> Option<LocalNodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: LocalNodeId) -> &[LocalNodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn range(&self, id: LocalNodeId) -> Option<TextRange> {
        self.get(id).map(|node| node.range)
    }

    /// `id` and then each of its ancestors up to the root.
    pub fn ancestors(&self, id: LocalNodeId) -> impl Iterator<Item = LocalNodeId> + '_ {
        std::iter::successors(self.get(id).map(|_| id), move |&current| self.parent(current))
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: LocalNodeId, node: LocalNodeId) -> bool {
        ancestor != node && self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether `node` ends before `pivot` starts.
    pub fn precedes(&self, node: LocalNodeId, pivot: LocalNodeId) -> bool {
        match (self.range(node), self.range(pivot)) {
            (Some(node), Some(pivot)) => node.end() <= pivot.start(),
            _ => false,
        }
    }

    /// All node ids in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = LocalNodeId> + '_ {
        (0..self.nodes.len() as u32).map(LocalNodeId::new)
    }

    /// Children of `id` that satisfy `pred` on their kind.
    pub fn children_where<'a>(
        &'a self,
        id: LocalNodeId,
        pred: impl Fn(&NodeKind) -> bool + 'a,
    ) -> impl Iterator<Item = LocalNodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.kind(child).is_some_and(&pred))
    }

    /// Binding patterns nested in a pattern node, in source order.
    pub fn bindings(&self, pattern: LocalNodeId) -> Vec<LocalNodeId> {
        let mut out = Vec::new();
        self.collect_bindings(pattern, &mut out);
        out
    }

    fn collect_bindings(&self, pattern: LocalNodeId, out: &mut Vec<LocalNodeId>) {
        match self.kind(pattern) {
            Some(NodeKind::BindingPat { .. }) => out.push(pattern),
            Some(NodeKind::TuplePat) => {
                for &child in self.children(pattern) {
                    self.collect_bindings(child, out);
                }
            }
            _ => {}
        }
    }
}
