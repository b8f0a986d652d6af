//! Document links: `mod name;` and `extern crate` items to their files.

use std::borrow::Cow;

use crate::base::{FileId, TextRange};
use crate::syntax::NodeKind;

use super::analysis::Analysis;

/// A document link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    /// The span of the link in the source file.
    pub range: TextRange,
    /// The file the link opens.
    pub target_file: FileId,
    /// Tooltip text for the link.
    pub tooltip: Cow<'static, str>,
}

/// Get document links for a file.
///
/// Returns clickable links for:
/// 1. `mod name;` declarations - link to the module's file
/// 2. `extern crate name;` items - link to the crate root
///
/// Declarations that do not resolve to exactly one file get no link.
pub fn document_links(analysis: &Analysis<'_>, file: FileId) -> Vec<DocumentLink> {
    let db = analysis.db();
    let mut links = Vec::new();

    let items = db.nodes_where(file, |kind| matches!(kind, NodeKind::ModDecl { .. } | NodeKind::ExternCrate { .. }));
    for item in items {
        let (target, name) = match db.kind(item) {
            Some(NodeKind::ModDecl { name }) => (analysis.resolve_mod_decl(item), name),
            Some(NodeKind::ExternCrate { name, .. }) => (analysis.resolve_extern_crate(item), name),
            _ => continue,
        };
        let (Some(target), Some(range)) = (target.single(), db.range(item)) else {
            continue;
        };
        let tooltip = match db.vfs().path(target.file) {
            Some(path) => Cow::Owned(format!("Go to {}", path.display())),
            None => Cow::Owned(format!("Go to {name}")),
        };
        links.push(DocumentLink { range, target_file: target.file, tooltip });
    }

    links
}
