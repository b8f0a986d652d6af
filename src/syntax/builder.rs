//! Tree construction.
//!
//! [`TreeBuilder`] is the seam between a parser and the resolver: the
//! parser calls [`start_node`](TreeBuilder::start_node) /
//! [`finish_node`](TreeBuilder::finish_node) in pre-order, or uses the
//! closure-nesting helpers below.
//!
//! ```
//! use quarry::syntax::{TreeBuilder, UnresolvedTy};
//!
//! let mut b = TreeBuilder::new();
//! b.struct_item("Point", |b| {
//!     b.field("x", UnresolvedTy::named("i32"));
//! });
//! let tree = b.finish();
//! assert_eq!(tree.len(), 3);
//! ```

use smol_str::SmolStr;

use super::ids::LocalNodeId;
use super::node::{Literal, NodeData, NodeKind, SyntaxTree, UseGroupItem, UseKind, UseTree};
use super::path::{PathPart, QualifiedPath};
use super::type_ref::UnresolvedTy;
use crate::base::{TextRange, TextSize};

/// Builds a [`SyntaxTree`] in pre-order.
///
/// Each node is given a synthetic range: its start is taken when the node
/// is opened and its end when it is closed, from one shared counter, so
/// ranges nest exactly like the nodes do and source order is preserved.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<LocalNodeId>,
    offset: u32,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// A builder with an open [`NodeKind::SourceFile`] root.
    pub fn new() -> Self {
        let mut builder = Self { nodes: Vec::new(), stack: Vec::new(), offset: 0 };
        builder.start_node(NodeKind::SourceFile);
        builder
    }

    /// Open a node as the last child of the current node.
    pub fn start_node(&mut self, kind: NodeKind) -> LocalNodeId {
        let id = LocalNodeId::new(self.nodes.len() as u32);
        let start = TextSize::from(self.offset);
        self.offset += 1;

        let parent = self.stack.last().copied();
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            range: TextRange::empty(start),
        });
        self.stack.push(id);
        id
    }

    /// Close the current node.
    pub fn finish_node(&mut self) {
        // The root stays open until `finish`.
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(id) = self.stack.pop() {
            self.close(id);
        }
    }

    fn close(&mut self, id: LocalNodeId) {
        let node = &mut self.nodes[id.index()];
        node.range = TextRange::new(node.range.start(), TextSize::from(self.offset));
        self.offset += 1;
    }

    /// Close every open node and return the tree.
    pub fn finish(mut self) -> SyntaxTree {
        while let Some(id) = self.stack.pop() {
            self.close(id);
        }
        SyntaxTree { nodes: self.nodes }
    }

    /// Open `kind`, run `f` to build its children, close it.
    pub fn node(&mut self, kind: NodeKind, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        let id = self.start_node(kind);
        f(self);
        self.finish_node();
        id
    }

    /// A node without children.
    pub fn leaf(&mut self, kind: NodeKind) -> LocalNodeId {
        self.node(kind, |_| {})
    }

    // ========================================================================
    // Items
    // ========================================================================

    pub fn module(&mut self, name: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Module { name: name.into() }, f)
    }

    pub fn mod_decl(&mut self, name: &str) -> LocalNodeId {
        self.leaf(NodeKind::ModDecl { name: name.into() })
    }

    pub fn fn_item(
        &mut self,
        name: &str,
        ret: Option<UnresolvedTy>,
        f: impl FnOnce(&mut Self),
    ) -> LocalNodeId {
        self.node(NodeKind::Function { name: name.into(), ret }, f)
    }

    pub fn self_param(&mut self, reference: bool, mutable: bool) -> LocalNodeId {
        self.leaf(NodeKind::SelfParam { reference, mutable })
    }

    /// `name: ty`. Returns the binding pattern.
    pub fn param(&mut self, name: &str, ty: UnresolvedTy) -> LocalNodeId {
        let mut binding = LocalNodeId::ROOT;
        self.node(NodeKind::Param { ty }, |b| binding = b.binding(name));
        binding
    }

    /// A parameter with an arbitrary pattern built by `f`.
    pub fn param_pat(&mut self, ty: UnresolvedTy, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Param { ty }, f)
    }

    pub fn type_param(&mut self, name: &str) -> LocalNodeId {
        self.leaf(NodeKind::TypeParam { name: name.into() })
    }

    pub fn struct_item(&mut self, name: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Struct { name: name.into() }, f)
    }

    pub fn field(&mut self, name: &str, ty: UnresolvedTy) -> LocalNodeId {
        self.leaf(NodeKind::Field { name: name.into(), ty })
    }

    pub fn enum_item(&mut self, name: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Enum { name: name.into() }, f)
    }

    pub fn variant(&mut self, name: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Variant { name: name.into() }, f)
    }

    pub fn trait_item(&mut self, name: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Trait { name: name.into() }, f)
    }

    /// `impl trait_ref for target { .. }`.
    pub fn impl_item(
        &mut self,
        trait_ref: Option<&str>,
        target: UnresolvedTy,
        f: impl FnOnce(&mut Self),
    ) -> LocalNodeId {
        let trait_ref = trait_ref.map(path_of);
        self.node(NodeKind::Impl { trait_ref, target }, f)
    }

    pub fn type_alias(&mut self, name: &str, ty: UnresolvedTy, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::TypeAlias { name: name.into(), ty }, f)
    }

    pub fn const_item(&mut self, name: &str, ty: UnresolvedTy) -> LocalNodeId {
        self.leaf(NodeKind::Const { name: name.into(), ty })
    }

    pub fn static_item(&mut self, name: &str, ty: UnresolvedTy) -> LocalNodeId {
        self.leaf(NodeKind::Static { name: name.into(), ty })
    }

    pub fn foreign_block(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::ForeignBlock, f)
    }

    pub fn extern_crate(&mut self, name: &str, alias: Option<&str>) -> LocalNodeId {
        self.leaf(NodeKind::ExternCrate { name: name.into(), alias: alias.map(SmolStr::new) })
    }

    /// `use path;` / `use path as alias;`
    pub fn use_path(&mut self, path: &str, alias: Option<&str>) -> LocalNodeId {
        let tree = UseTree {
            path: Some(path_of(path)),
            kind: UseKind::Single { alias: alias.map(SmolStr::new) },
        };
        self.leaf(NodeKind::Use(tree))
    }

    /// `use path::*;`
    pub fn use_glob(&mut self, path: &str) -> LocalNodeId {
        self.leaf(NodeKind::Use(UseTree { path: Some(path_of(path)), kind: UseKind::Glob }))
    }

    /// `use path::{items};` where each item is `(name, alias)` and a `None`
    /// name is `self`. A `None` path is `use ::{items}`.
    pub fn use_group(&mut self, path: Option<&str>, items: &[(Option<&str>, Option<&str>)]) -> LocalNodeId {
        let items = items
            .iter()
            .map(|&(name, alias)| UseGroupItem {
                name: name.map(SmolStr::new),
                alias: alias.map(SmolStr::new),
            })
            .collect();
        let tree = UseTree { path: path.map(path_of), kind: UseKind::Group(items) };
        self.leaf(NodeKind::Use(tree))
    }

    // ========================================================================
    // Statements and patterns
    // ========================================================================

    pub fn block(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Block, f)
    }

    /// `let name: ty = init;`. `init` may add no expression.
    /// Returns the binding pattern.
    pub fn let_stmt(
        &mut self,
        name: &str,
        ty: Option<UnresolvedTy>,
        init: impl FnOnce(&mut Self),
    ) -> LocalNodeId {
        let mut binding = LocalNodeId::ROOT;
        self.node(NodeKind::Let { ty }, |b| {
            binding = b.binding(name);
            init(b);
        });
        binding
    }

    /// A `let` whose pattern and initializer are both built by `f`.
    pub fn let_pat(&mut self, ty: Option<UnresolvedTy>, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Let { ty }, f)
    }

    pub fn binding(&mut self, name: &str) -> LocalNodeId {
        self.leaf(NodeKind::BindingPat { name: name.into(), mutable: false })
    }

    pub fn mut_binding(&mut self, name: &str) -> LocalNodeId {
        self.leaf(NodeKind::BindingPat { name: name.into(), mutable: true })
    }

    pub fn tuple_pat(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::TuplePat, f)
    }

    pub fn wildcard_pat(&mut self) -> LocalNodeId {
        self.leaf(NodeKind::WildcardPat)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn path_expr(&mut self, path: &str) -> LocalNodeId {
        self.leaf(NodeKind::PathExpr { path: path_of(path) })
    }

    pub fn literal(&mut self, literal: Literal) -> LocalNodeId {
        self.leaf(NodeKind::Literal(literal))
    }

    /// `receiver.field`; `f` builds the receiver.
    pub fn field_expr(&mut self, field: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::FieldExpr { field: field.into() }, f)
    }

    /// `receiver.method(args)`; `f` builds the receiver, then the arguments.
    pub fn method_call(&mut self, method: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::MethodCall { method: method.into() }, f)
    }

    /// `callee(args)`; `f` builds the callee, then the arguments.
    pub fn call(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Call, f)
    }

    pub fn struct_lit(&mut self, path: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::StructLit { path: path_of(path) }, f)
    }

    pub fn struct_lit_field(&mut self, name: &str, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::StructLitField { name: name.into() }, f)
    }

    pub fn ref_expr(&mut self, mutable: bool, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::RefExpr { mutable }, f)
    }

    pub fn tuple_expr(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::TupleExpr, f)
    }

    /// `if let pat = scrutinee { .. } else { .. }`.
    pub fn if_let(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::IfLet, f)
    }

    pub fn while_let(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::WhileLet, f)
    }

    /// `for pat in iterable { .. }`.
    pub fn for_expr(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::For, f)
    }

    pub fn match_expr(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Match, f)
    }

    pub fn match_arm(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::MatchArm, f)
    }

    /// `|params| body`; `f` builds parameter patterns, then the body.
    pub fn closure(&mut self, f: impl FnOnce(&mut Self)) -> LocalNodeId {
        self.node(NodeKind::Closure, f)
    }
}

/// Parse a path, falling back to a single segment for text that is not
/// a well-formed path so that it simply fails to resolve.
fn path_of(text: &str) -> QualifiedPath {
    QualifiedPath::parse(text).unwrap_or_else(|| QualifiedPath::ident(PathPart::Named(text.into())))
}
