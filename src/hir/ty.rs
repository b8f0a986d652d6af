//! Semantic types.

use std::fmt;

use crate::syntax::{NodeId, PrimTy};

use super::db::Workspace;

/// A resolved type.
///
/// `Unknown` is the bottom type produced whenever resolution fails, which
/// keeps every type computation total.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Primitive(PrimTy),
    Ref { inner: Box<Ty>, mutable: bool },
    /// The empty tuple is unit.
    Tuple(Vec<Ty>),
    Fn { params: Vec<Ty>, ret: Box<Ty> },
    /// A struct or enum, by declaration.
    Adt(NodeId),
    Unknown,
}

impl Ty {
    pub fn unit() -> Ty {
        Ty::Tuple(Vec::new())
    }

    pub fn reference(inner: Ty, mutable: bool) -> Ty {
        Ty::Ref { inner: Box::new(inner), mutable }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Ty::Unknown)
    }

    pub fn as_adt(&self) -> Option<NodeId> {
        match self {
            Ty::Adt(decl) => Some(*decl),
            _ => None,
        }
    }

    /// The referent of a reference type.
    pub fn deref_once(&self) -> Option<&Ty> {
        match self {
            Ty::Ref { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// The type with every reference layer removed.
    pub fn strip_refs(&self) -> &Ty {
        let mut ty = self;
        while let Some(inner) = ty.deref_once() {
            ty = inner;
        }
        ty
    }

    /// Render the type, naming declarations through `db`.
    pub fn display<'a>(&'a self, db: &'a Workspace) -> TyDisplay<'a> {
        TyDisplay { ty: self, db }
    }
}

/// See [`Ty::display`].
pub struct TyDisplay<'a> {
    ty: &'a Ty,
    db: &'a Workspace,
}

impl fmt::Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Ty::Primitive(prim) => write!(f, "{prim}"),
            Ty::Ref { inner, mutable } => {
                f.write_str(if *mutable { "&mut " } else { "&" })?;
                write!(f, "{}", inner.display(self.db))
            }
            Ty::Tuple(elements) => {
                f.write_str("(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element.display(self.db))?;
                }
                if elements.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Ty::Fn { params, ret } => {
                f.write_str("fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param.display(self.db))?;
                }
                write!(f, ") -> {}", ret.display(self.db))
            }
            Ty::Adt(decl) => match self.db.kind(*decl).and_then(|kind| kind.name()) {
                Some(name) => f.write_str(name),
                None => f.write_str("{unknown}"),
            },
            Ty::Unknown => f.write_str("{unknown}"),
        }
    }
}
