//! IDE features: High-level APIs for editor requests.
//!
//! This module is the interface between the resolver (HIR) and an editor
//! protocol layer. Each function corresponds to one request.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: Take data in, return data out
//! 2. **No protocol types**: Uses our own types, converted at the boundary
//! 3. **Composable**: Built on top of HIR queries
//!
//! ## Usage
//!
//! ```
//! use quarry::ide::{goto_definition, AnalysisHost};
//! use quarry::syntax::{NodeId, TreeBuilder};
//!
//! let mut b = TreeBuilder::new();
//! b.struct_item("Point", |_| {});
//! let lit = b.struct_lit("Point", |_| {});
//!
//! let mut host = AnalysisHost::new();
//! let file = host.set_file("/src/lib.rs", b.finish());
//!
//! let analysis = host.analysis();
//! let result = goto_definition(&analysis, NodeId::new(file, lit));
//! assert_eq!(result.single().and_then(|t| t.name.as_deref()), Some("Point"));
//! ```

mod analysis;
mod document_links;
mod goto;
mod inlay_hints;

pub use analysis::{Analysis, AnalysisHost};
pub use document_links::{document_links, DocumentLink};
pub use goto::{goto_definition, GotoResult, GotoTarget};
pub use inlay_hints::{inlay_hints, type_hint, InlayHint, InlayHintKind};
