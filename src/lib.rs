//! # quarry-base
//!
//! Name resolution, typification and implementation indexing for a
//! module-and-trait based systems language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → Editor-facing facade (AnalysisHost, goto, inlay hints, links)
//!   ↓
//! hir     → Scopes, resolution, types, impl index, diagnostics
//!   ↓
//! syntax  → Syntax tree consumed by the resolver (built by a parser)
//!   ↓
//! base    → Primitives (FileId, Vfs, TextRange)
//! ```
//!
//! ## Features
//!
//! - `persistence` - implementation-index snapshots via `serde_json`
//! - `proptest` - property tests for structural key equality
//!
//! The library emits `tracing` events and never installs a subscriber.

/// Foundation types: FileId, Vfs, text ranges
pub mod base;

/// Syntax trees and the builder parsers use to produce them
pub mod syntax;

/// High-level IR: resolution, typification, implementation index
pub mod hir;

/// IDE features: goto-definition, inlay hints, document links
pub mod ide;

// Re-export the types most callers need
pub use base::{FileId, TextRange, TextSize};
pub use hir::{ResolveResult, Resolver, Ty, Workspace};
pub use ide::{Analysis, AnalysisHost};
pub use syntax::{NodeId, QualifiedPath, TreeBuilder};
