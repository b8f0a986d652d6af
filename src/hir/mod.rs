//! High-level IR: name resolution, typification and the implementation index.
//!
//! ## Layout
//!
//! - [`Workspace`] - files, crates, collaborators, version stamp and caches
//! - [`Resolver`] - a query session; every operation below is a method on it
//! - `scope` - what each scope node makes visible, as lazy prioritized entries
//! - `resolve` - paths, imports, module files and member references
//! - `typify` - declaration, written and expression types
//! - `impls` - structural impl lookup by target type
//! - [`check_file`] - unresolved and ambiguous reference diagnostics
//!
//! ## Usage
//!
//! ```
//! use std::path::Path;
//! use quarry::hir::{QualifiedPath, Workspace};
//! use quarry::syntax::{NodeId, TreeBuilder};
//!
//! let mut b = TreeBuilder::new();
//! let item = b.fn_item("answer", None, |_| {});
//! let mut use_site = None;
//! b.fn_item("main", None, |b| {
//!     b.block(|b| {
//!         use_site = Some(b.path_expr("answer"));
//!     });
//! });
//!
//! let mut db = Workspace::new();
//! let file = db.set_file(Path::new("/src/lib.rs"), b.finish());
//! let resolver = db.resolver();
//!
//! let path = QualifiedPath::parse("answer").unwrap();
//! let pivot = NodeId::new(file, use_site.unwrap());
//! assert_eq!(resolver.resolve(&path, pivot).single(), Some(NodeId::new(file, item)));
//! ```

mod cache;
mod db;
mod diagnostics;
mod error;
mod impls;
mod input;
#[cfg(feature = "persistence")]
mod persist;
mod resolve;
mod scope;
mod ty;
mod typify;

pub use cache::{GuardKey, InProgress, RecursionGuard};
pub use db::Workspace;
pub use diagnostics::{check_file, codes, Diagnostic, RelatedInfo};
pub use error::{IndexError, WorkspaceError};
pub use impls::{AliasIndex, ImplIndexStore, ImplKey, Implementations, MemoryImplStore};
pub use input::{CrateData, CrateGraph, ModuleTopology, PreludeSupplier, ResolveConfig, StdPrelude};
#[cfg(feature = "persistence")]
pub use persist::{decode_snapshot, encode_snapshot, load_snapshot};
pub use resolve::{ResolveResult, Resolver};
pub use scope::{tiers, Entries, Priority, ScopeContext, ScopeEntry};
pub use ty::{Ty, TyDisplay};

pub use crate::syntax::{PathPart, QualifiedPath};
