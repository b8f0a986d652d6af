//! Typification: declaration types, written types and expression types.
//!
//! Every function here is total. Whatever cannot be resolved, or is not
//! modeled, becomes [`Ty::Unknown`], and unknown types propagate outwards.

use crate::syntax::{FloatTy, IntTy, Literal, NodeId, NodeKind, PathPart, PrimTy, UnresolvedTy};

use super::cache::GuardKey;
use super::resolve::Resolver;
use super::ty::Ty;

impl<'db> Resolver<'db> {
    /// The type of a declaration: a type declaration's own type, a value
    /// declaration's declared or inferred type.
    pub fn typify(&self, decl: NodeId) -> Ty {
        self.memoized(&self.db().caches.decl_types, decl, GuardKey::Typify(decl), Ty::Unknown, || {
            self.typify_decl(decl)
        })
    }

    fn typify_decl(&self, decl: NodeId) -> Ty {
        let db = self.db();
        let Some(kind) = db.kind(decl) else {
            return Ty::Unknown;
        };
        match kind {
            NodeKind::Struct { .. } | NodeKind::Enum { .. } => Ty::Adt(decl),
            NodeKind::Variant { .. } => db.parent(decl).map_or(Ty::Unknown, Ty::Adt),
            NodeKind::TypeAlias { ty, .. } => self.resolve_type(ty, decl),
            NodeKind::Function { ret, .. } => {
                let params = db
                    .children(decl)
                    .filter_map(|child| match db.kind(child)? {
                        NodeKind::SelfParam { .. } => Some(self.typify(child)),
                        NodeKind::Param { ty } => Some(self.resolve_type(ty, child)),
                        _ => None,
                    })
                    .collect();
                let ret = match ret {
                    Some(ret) => self.resolve_type(ret, decl),
                    None => Ty::unit(),
                };
                Ty::Fn { params, ret: Box::new(ret) }
            }
            NodeKind::Field { ty, .. }
            | NodeKind::Const { ty, .. }
            | NodeKind::Static { ty, .. }
            | NodeKind::Param { ty } => self.resolve_type(ty, decl),
            NodeKind::SelfParam { reference, mutable } => {
                let owner = db.parent(decl).and_then(|function| db.parent(function));
                let self_ty = match owner.and_then(|owner| Some((owner, db.kind(owner)?))) {
                    Some((imp, NodeKind::Impl { .. })) => self.impl_target_ty(imp),
                    _ => Ty::Unknown,
                };
                if *reference { Ty::reference(self_ty, *mutable) } else { self_ty }
            }
            NodeKind::BindingPat { .. } => self.pattern_ty(decl),
            NodeKind::Impl { .. } => self.impl_target_ty(decl),
            _ => Ty::Unknown,
        }
    }

    /// The type a pattern matches, derived from where it is bound.
    fn pattern_ty(&self, pattern: NodeId) -> Ty {
        let db = self.db();
        let Some(parent) = db.parent(pattern) else {
            return Ty::Unknown;
        };
        match db.kind(parent) {
            Some(NodeKind::Let { ty: Some(ty) }) => self.resolve_type(ty, parent),
            Some(NodeKind::Let { ty: None }) => match db.child(parent, 1) {
                Some(init) => self.typify_expr(init),
                None => Ty::Unknown,
            },
            Some(NodeKind::Param { ty }) => self.resolve_type(ty, parent),
            Some(NodeKind::TuplePat) => {
                let Some(index) = db.children(parent).position(|child| child == pattern) else {
                    return Ty::Unknown;
                };
                match self.pattern_ty(parent) {
                    Ty::Tuple(mut elements) if index < elements.len() => elements.swap_remove(index),
                    _ => Ty::Unknown,
                }
            }
            _ => Ty::Unknown,
        }
    }

    /// Resolve a written type at `pivot`.
    pub fn resolve_type(&self, ty: &UnresolvedTy, pivot: NodeId) -> Ty {
        if let UnresolvedTy::Primitive(prim) = ty {
            return Ty::Primitive(*prim);
        }
        let key = (ty.clone(), pivot);
        self.memoized(&self.db().caches.written_types, key.clone(), GuardKey::ResolveType(key), Ty::Unknown, || {
            self.resolve_written(ty, pivot)
        })
    }

    fn resolve_written(&self, ty: &UnresolvedTy, pivot: NodeId) -> Ty {
        match ty {
            UnresolvedTy::Primitive(prim) => Ty::Primitive(*prim),
            UnresolvedTy::Tuple(elements) => {
                Ty::Tuple(elements.iter().map(|element| self.resolve_type(element, pivot)).collect())
            }
            UnresolvedTy::Ref { inner, mutable } => Ty::reference(self.resolve_type(inner, pivot), *mutable),
            UnresolvedTy::Fn { params, ret } => Ty::Fn {
                params: params.iter().map(|param| self.resolve_type(param, pivot)).collect(),
                ret: Box::new(self.resolve_type(ret, pivot)),
            },
            UnresolvedTy::Path(path) => {
                let is_self_type = path.qualifier().is_none() && *path.part() == PathPart::SelfType;
                if is_self_type && let Some(ty) = self.impl_self_type(pivot) {
                    return ty;
                }
                match self.resolve(path, pivot).single() {
                    Some(decl) => self.typify(decl),
                    None => Ty::Unknown,
                }
            }
            UnresolvedTy::Slice(_) | UnresolvedTy::Infer => Ty::Unknown,
        }
    }

    /// `Self` inside an impl: the impl's target type.
    fn impl_self_type(&self, pivot: NodeId) -> Option<Ty> {
        let db = self.db();
        let imp = db.ancestors(pivot).find(|&node| matches!(db.kind(node), Some(NodeKind::Impl { .. })))?;
        let NodeKind::Impl { target, .. } = db.kind(imp)? else {
            return None;
        };
        if let UnresolvedTy::Path(path) = target
            && *path.part() == PathPart::SelfType
        {
            return Some(Ty::Unknown);
        }
        Some(self.resolve_type(target, imp))
    }

    /// The type of an expression.
    pub fn typify_expr(&self, expr: NodeId) -> Ty {
        self.memoized(&self.db().caches.expr_types, expr, GuardKey::TypifyExpr(expr), Ty::Unknown, || {
            self.infer_expr(expr)
        })
    }

    fn infer_expr(&self, expr: NodeId) -> Ty {
        let db = self.db();
        let Some(kind) = db.kind(expr) else {
            return Ty::Unknown;
        };
        match kind {
            NodeKind::PathExpr { path } => match self.resolve(path, expr).single() {
                Some(decl) => self.typify(decl),
                None => Ty::Unknown,
            },
            NodeKind::Literal(literal) => literal_ty(literal),
            NodeKind::RefExpr { mutable } => {
                let inner = db.child(expr, 0).map_or(Ty::Unknown, |operand| self.typify_expr(operand));
                Ty::reference(inner, *mutable)
            }
            NodeKind::TupleExpr => Ty::Tuple(db.children(expr).map(|element| self.typify_expr(element)).collect()),
            NodeKind::FieldExpr { .. } => match self.resolve_field_access(expr).single() {
                Some(field) => self.typify(field),
                None => Ty::Unknown,
            },
            NodeKind::MethodCall { .. } => match self.resolve_method_call(expr).single().map(|m| self.typify(m)) {
                Some(Ty::Fn { ret, .. }) => *ret,
                _ => Ty::Unknown,
            },
            NodeKind::Call => match db.child(expr, 0).map(|callee| self.typify_expr(callee)) {
                Some(Ty::Fn { ret, .. }) => *ret,
                _ => Ty::Unknown,
            },
            NodeKind::StructLit { path } => {
                let Some(target) = self.resolve(path, expr).single() else {
                    return Ty::Unknown;
                };
                match db.kind(target) {
                    Some(NodeKind::Struct { .. } | NodeKind::Variant { .. } | NodeKind::TypeAlias { .. }) => {
                        self.typify(target)
                    }
                    _ => Ty::Unknown,
                }
            }
            NodeKind::Block => {
                let tail = db.children(expr).last().filter(|&last| db.kind(last).is_some_and(NodeKind::is_expr));
                match tail {
                    Some(tail) => self.typify_expr(tail),
                    None => Ty::unit(),
                }
            }
            _ => Ty::Unknown,
        }
    }
}

fn literal_ty(literal: &Literal) -> Ty {
    let prim = match literal {
        Literal::Int { suffix } => PrimTy::Int(suffix.unwrap_or(IntTy::I32)),
        Literal::Float { suffix } => PrimTy::Float(suffix.unwrap_or(FloatTy::F64)),
        Literal::Bool => PrimTy::Bool,
        Literal::Char => PrimTy::Char,
        Literal::Str => return Ty::reference(Ty::Primitive(PrimTy::Str), false),
    };
    Ty::Primitive(prim)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::hir::Workspace;
    use crate::syntax::{LocalNodeId, TreeBuilder};

    fn named(text: &str) -> UnresolvedTy {
        UnresolvedTy::named(text)
    }

    #[test]
    fn test_literal_defaults() {
        assert_eq!(literal_ty(&Literal::Int { suffix: None }), Ty::Primitive(PrimTy::Int(IntTy::I32)));
        assert_eq!(
            literal_ty(&Literal::Int { suffix: Some(IntTy::U8) }),
            Ty::Primitive(PrimTy::Int(IntTy::U8))
        );
        assert_eq!(literal_ty(&Literal::Float { suffix: None }), Ty::Primitive(PrimTy::Float(FloatTy::F64)));
        assert_eq!(literal_ty(&Literal::Str), Ty::reference(Ty::Primitive(PrimTy::Str), false));
    }

    #[test]
    fn test_let_binding_types() {
        let mut b = TreeBuilder::new();
        let (mut a, mut x, mut y, mut p) = (LocalNodeId::ROOT, LocalNodeId::ROOT, LocalNodeId::ROOT, LocalNodeId::ROOT);
        let s = b.struct_item("S", |b| {
            b.field("n", named("u8"));
        });
        b.fn_item("f", None, |b| {
            p = b.param("p", UnresolvedTy::reference(named("S"), false));
            b.block(|b| {
                a = b.let_stmt("a", None, |b| {
                    b.struct_lit("S", |_| {});
                });
                b.let_pat(None, |b| {
                    b.tuple_pat(|b| {
                        x = b.binding("x");
                        y = b.binding("y");
                    });
                    b.tuple_expr(|b| {
                        b.literal(Literal::Bool);
                        b.field_expr("n", |b| {
                            b.path_expr("a");
                        });
                    });
                });
            });
        });
        let mut db = Workspace::new();
        let file = db.set_file(Path::new("/lib.rs"), b.finish());
        let node = |local| NodeId::new(file, local);
        let resolver = db.resolver();

        assert_eq!(resolver.typify(node(a)), Ty::Adt(node(s)));
        assert_eq!(resolver.typify(node(x)), Ty::Primitive(PrimTy::Bool));
        assert_eq!(resolver.typify(node(y)), Ty::Primitive(PrimTy::Int(IntTy::U8)));
        assert_eq!(resolver.typify(node(p)), Ty::reference(Ty::Adt(node(s)), false));
    }

    #[test]
    fn test_self_in_impl_resolves_to_target() {
        let mut b = TreeBuilder::new();
        let mut new = LocalNodeId::ROOT;
        let mut prim_new = LocalNodeId::ROOT;
        let s = b.struct_item("S", |_| {});
        b.impl_item(None, named("S"), |b| {
            new = b.fn_item("new", Some(named("Self")), |_| {});
        });
        b.impl_item(Some("Default"), named("u32"), |b| {
            prim_new = b.fn_item("default", Some(named("Self")), |_| {});
        });
        let mut db = Workspace::new();
        let file = db.set_file(Path::new("/lib.rs"), b.finish());
        let resolver = db.resolver();

        let fn_ty = resolver.typify(NodeId::new(file, new));
        assert_eq!(fn_ty, Ty::Fn { params: vec![], ret: Box::new(Ty::Adt(NodeId::new(file, s))) });

        let fn_ty = resolver.typify(NodeId::new(file, prim_new));
        assert_eq!(fn_ty, Ty::Fn { params: vec![], ret: Box::new(Ty::Primitive(PrimTy::Int(IntTy::U32))) });
    }

    #[test]
    fn test_written_types_are_cached_per_pivot() {
        let mut b = TreeBuilder::new();
        let (mut x, mut y) = (LocalNodeId::ROOT, LocalNodeId::ROOT);
        let s = b.struct_item("S", |_| {});
        b.fn_item("f", None, |b| {
            b.block(|b| {
                x = b.let_stmt("x", Some(UnresolvedTy::reference(named("S"), false)), |_| {});
                y = b.let_stmt("y", Some(named("u8")), |_| {});
            });
        });
        let mut db = Workspace::new();
        let file = db.set_file(Path::new("/lib.rs"), b.finish());
        let resolver = db.resolver();
        let written = UnresolvedTy::reference(named("S"), false);
        let expected = Ty::reference(Ty::Adt(NodeId::new(file, s)), false);

        assert_eq!(resolver.typify(NodeId::new(file, x)), expected);
        assert_eq!(resolver.typify(NodeId::new(file, y)), Ty::Primitive(PrimTy::Int(IntTy::U8)));
        // `&S` and its inner `S`; primitives are not stored.
        let cached = db.caches.written_types.len();
        assert_eq!(cached, 2);

        let stmt = db.parent(NodeId::new(file, x)).unwrap();
        assert_eq!(resolver.resolve_type(&written, stmt), expected);
        assert_eq!(db.caches.written_types.len(), cached);
    }

    #[test]
    fn test_unresolvable_types_are_unknown() {
        let mut b = TreeBuilder::new();
        let mut x = LocalNodeId::ROOT;
        let alias = b.type_alias("Loop", named("Loop"), |_| {});
        b.fn_item("f", None, |b| {
            b.block(|b| {
                x = b.let_stmt("x", Some(named("Missing")), |_| {});
            });
        });
        let mut db = Workspace::new();
        let file = db.set_file(Path::new("/lib.rs"), b.finish());
        let resolver = db.resolver();

        assert!(resolver.typify(NodeId::new(file, x)).is_unknown());
        assert!(resolver.typify(NodeId::new(file, alias)).is_unknown());
    }
}
