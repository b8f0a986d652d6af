//! Syntax node identifiers.

use std::fmt;

use crate::base::FileId;

/// A globally unique identifier for a syntax node.
///
/// Combines the file the node lives in with a file-local index. Every
/// declaration, scope and reference handled by the resolver is a `NodeId`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId {
    /// The file containing this node
    pub file: FileId,
    /// The index within the file's tree
    pub local: LocalNodeId,
}

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub const fn new(file: FileId, local: LocalNodeId) -> Self {
        Self { file, local }
    }

    /// The root node of `file`.
    #[inline]
    pub const fn root(file: FileId) -> Self {
        Self { file, local: LocalNodeId::ROOT }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:?}:{})", self.file, self.local.0)
    }
}

/// A file-local node index.
///
/// Indices are assigned in pre-order as the tree is built, so the source
/// file itself is always index 0.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalNodeId(pub u32);

impl LocalNodeId {
    pub const ROOT: LocalNodeId = LocalNodeId(0);

    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LocalNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalNodeId({})", self.0)
    }
}
