//! Error types for conditions that are genuine failures.
//!
//! Unresolved names and unknown types are not errors; they are modeled by
//! [`ResolveResult`](super::ResolveResult) and [`Ty::Unknown`](super::Ty::Unknown).

use thiserror::Error;

use crate::base::FileId;
use crate::syntax::NodeId;

/// Failures of the persisted implementation index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A snapshot could not be decoded. Continuing would produce unsound
    /// lookups, so callers must rebuild the index.
    #[error("implementation index is corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("failed to encode implementation index: {reason}")]
    Encode { reason: String },
}

/// Misuse of the workspace API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("unknown file: {0}")]
    UnknownFile(FileId),

    #[error("node {0:?} is not a module")]
    NotAModule(NodeId),
}
