//! Go to definition.

use crate::base::{FileId, TextRange};
use crate::syntax::NodeId;

use super::analysis::Analysis;

/// A definition to navigate to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoTarget {
    pub node: NodeId,
    pub file: FileId,
    pub range: TextRange,
    /// The declared name, if the target is a named declaration.
    pub name: Option<String>,
}

/// Targets of a goto request. Ambiguous references yield every candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GotoResult {
    pub targets: Vec<GotoTarget>,
}

impl GotoResult {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.targets.len() > 1
    }

    /// The single target, if there is exactly one.
    pub fn single(&self) -> Option<&GotoTarget> {
        match self.targets.as_slice() {
            [target] => Some(target),
            _ => None,
        }
    }
}

/// Resolve the reference carried by `node` to its definition(s).
pub fn goto_definition(analysis: &Analysis<'_>, node: NodeId) -> GotoResult {
    let db = analysis.db();
    let targets = analysis
        .resolve_reference(node)
        .candidates()
        .iter()
        .filter_map(|&target| {
            Some(GotoTarget {
                node: target,
                file: target.file,
                range: db.range(target)?,
                name: db.kind(target)?.name().map(ToString::to_string),
            })
        })
        .collect();
    GotoResult { targets }
}
