//! Syntax layer: the tree shape the resolver consumes.
//!
//! Parsing source text is not done here. A parser (or a test) drives a
//! [`TreeBuilder`] and hands the finished [`SyntaxTree`] to the workspace.
//!
//! - [`QualifiedPath`] / [`PathPart`] - paths as written
//! - [`UnresolvedTy`] - types as written
//! - [`NodeKind`] / [`SyntaxTree`] - the node arena
//! - [`NodeId`] - file + file-local node index

mod builder;
mod ids;
mod node;
mod path;
mod type_ref;

pub use builder::TreeBuilder;
pub use ids::{LocalNodeId, NodeId};
pub use node::{Literal, NodeData, NodeKind, SyntaxTree, UseGroupItem, UseKind, UseTree};
pub use path::{PathPart, QualifiedPath};
pub use type_ref::{FloatTy, IntTy, PrimTy, UnresolvedTy};
