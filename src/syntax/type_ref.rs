//! Syntactic (unresolved) types, as written in source.

use std::fmt;

use super::path::QualifiedPath;

/// Integer scalar kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
}

/// Floating point scalar kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum FloatTy {
    F32,
    F64,
}

/// Primitive scalar kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimTy {
    Bool,
    Char,
    Str,
    Int(IntTy),
    Float(FloatTy),
}

impl PrimTy {
    /// Recognize a primitive type name.
    pub fn from_name(name: &str) -> Option<Self> {
        let prim = match name {
            "bool" => PrimTy::Bool,
            "char" => PrimTy::Char,
            "str" => PrimTy::Str,
            "i8" => PrimTy::Int(IntTy::I8),
            "i16" => PrimTy::Int(IntTy::I16),
            "i32" => PrimTy::Int(IntTy::I32),
            "i64" => PrimTy::Int(IntTy::I64),
            "i128" => PrimTy::Int(IntTy::I128),
            "isize" => PrimTy::Int(IntTy::Isize),
            "u8" => PrimTy::Int(IntTy::U8),
            "u16" => PrimTy::Int(IntTy::U16),
            "u32" => PrimTy::Int(IntTy::U32),
            "u64" => PrimTy::Int(IntTy::U64),
            "u128" => PrimTy::Int(IntTy::U128),
            "usize" => PrimTy::Int(IntTy::Usize),
            "f32" => PrimTy::Float(FloatTy::F32),
            "f64" => PrimTy::Float(FloatTy::F64),
            _ => return None,
        };
        Some(prim)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimTy::Bool => "bool",
            PrimTy::Char => "char",
            PrimTy::Str => "str",
            PrimTy::Int(int) => match int {
                IntTy::I8 => "i8",
                IntTy::I16 => "i16",
                IntTy::I32 => "i32",
                IntTy::I64 => "i64",
                IntTy::I128 => "i128",
                IntTy::Isize => "isize",
                IntTy::U8 => "u8",
                IntTy::U16 => "u16",
                IntTy::U32 => "u32",
                IntTy::U64 => "u64",
                IntTy::U128 => "u128",
                IntTy::Usize => "usize",
            },
            PrimTy::Float(FloatTy::F32) => "f32",
            PrimTy::Float(FloatTy::F64) => "f64",
        }
    }
}

impl fmt::Display for PrimTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type as written, before any path inside it has been resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnresolvedTy {
    /// `Foo`, `a::Foo`, `Self`, `T`.
    Path(QualifiedPath),
    /// `(A, B)`; the empty tuple is unit.
    Tuple(Vec<UnresolvedTy>),
    /// `fn(A, B) -> R`.
    Fn { params: Vec<UnresolvedTy>, ret: Box<UnresolvedTy> },
    /// `&T` / `&mut T`.
    Ref { inner: Box<UnresolvedTy>, mutable: bool },
    Primitive(PrimTy),
    /// `[T]`; not modeled by the type system.
    Slice(Box<UnresolvedTy>),
    /// `_`; not modeled by the type system.
    Infer,
}

impl UnresolvedTy {
    /// A path type, or the primitive of that name for a single-segment
    /// primitive name.
    pub fn named(text: &str) -> Self {
        if let Some(prim) = PrimTy::from_name(text) {
            return UnresolvedTy::Primitive(prim);
        }
        match QualifiedPath::parse(text) {
            Some(path) => UnresolvedTy::Path(path),
            None => UnresolvedTy::Infer,
        }
    }

    pub fn unit() -> Self {
        UnresolvedTy::Tuple(Vec::new())
    }

    pub fn reference(inner: UnresolvedTy, mutable: bool) -> Self {
        UnresolvedTy::Ref { inner: Box::new(inner), mutable }
    }

    pub fn function(params: Vec<UnresolvedTy>, ret: UnresolvedTy) -> Self {
        UnresolvedTy::Fn { params, ret: Box::new(ret) }
    }

    /// The single name of a one-segment path type, if that is what this is.
    pub fn single_name(&self) -> Option<&str> {
        match self {
            UnresolvedTy::Path(path) if path.qualifier().is_none() && !path.is_fully_qualified() => {
                path.part().name_if_named()
            }
            _ => None,
        }
    }
}

impl fmt::Display for UnresolvedTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedTy::Path(path) => write!(f, "{path}"),
            UnresolvedTy::Tuple(elements) => {
                f.write_str("(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                if elements.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            UnresolvedTy::Fn { params, ret } => {
                f.write_str("fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {ret}")
            }
            UnresolvedTy::Ref { inner, mutable: true } => write!(f, "&mut {inner}"),
            UnresolvedTy::Ref { inner, mutable: false } => write!(f, "&{inner}"),
            UnresolvedTy::Primitive(prim) => write!(f, "{prim}"),
            UnresolvedTy::Slice(inner) => write!(f, "[{inner}]"),
            UnresolvedTy::Infer => f.write_str("_"),
        }
    }
}
