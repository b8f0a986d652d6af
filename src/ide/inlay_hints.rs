//! Inlay hints: inferred types of unannotated `let` bindings.

use crate::base::{FileId, TextRange, TextSize};
use crate::syntax::{NodeId, NodeKind};

use super::analysis::Analysis;

/// Kind of inlay hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlayHintKind {
    /// Type annotation hint (e.g., `: i32`)
    Type,
}

/// An inlay hint to display in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlayHint {
    /// Where the hint should appear: the end of the binding.
    pub offset: TextSize,
    pub label: String,
    pub kind: InlayHintKind,
    /// Whether to add padding before the hint
    pub padding_left: bool,
    /// Whether to add padding after the hint
    pub padding_right: bool,
}

/// Get inlay hints for a file.
///
/// Every binding introduced by a `let` without a type annotation gets a
/// type hint, unless its type is unknown. With `range`, only bindings
/// inside it are considered.
pub fn inlay_hints(analysis: &Analysis<'_>, file: FileId, range: Option<TextRange>) -> Vec<InlayHint> {
    let db = analysis.db();
    let mut hints = Vec::new();

    for stmt in db.nodes_where(file, |kind| matches!(kind, NodeKind::Let { ty: None })) {
        let Some(pattern) = db.child(stmt, 0) else { continue };
        for binding in analysis.resolver().bindings(pattern) {
            let Some(binding_range) = db.range(binding) else { continue };
            if range.is_some_and(|range| !range.contains_range(binding_range)) {
                continue;
            }
            let ty = analysis.typify(binding);
            if ty.is_unknown() {
                continue;
            }
            hints.push(InlayHint {
                offset: binding_range.end(),
                label: format!(": {}", ty.display(db)),
                kind: InlayHintKind::Type,
                padding_left: false,
                padding_right: true,
            });
        }
    }

    hints.sort_by_key(|hint| hint.offset);
    hints
}

/// Hint for one binding, regardless of annotations.
pub fn type_hint(analysis: &Analysis<'_>, binding: NodeId) -> Option<String> {
    let ty = analysis.typify(binding);
    (!ty.is_unknown()).then(|| ty.display(analysis.db()).to_string())
}
