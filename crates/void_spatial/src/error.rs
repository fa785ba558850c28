//! Error types for the scene index

use thiserror::Error;

use crate::node::NodeId;

/// Scene index errors
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Configuration values out of range
    #[error("Invalid spatial configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed
    #[error("Failed to parse spatial configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The hierarchy broke one of its structural invariants
    #[error("Malformed hierarchy: {0}")]
    Malformed(#[from] ValidationError),
}

/// A structural invariant the hierarchy failed to uphold
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("root node is missing")]
    MissingRoot,

    #[error("node {0:?} is referenced but not allocated")]
    DanglingNode(NodeId),

    #[error("node {0:?} is reachable more than once")]
    Cycle(NodeId),

    #[error("root has a right child but no left child")]
    RootRightOnly,

    #[error("node {0:?} appears below the top of the tree as a root")]
    NestedRoot(NodeId),

    #[error("node {child:?} points at parent {found:?}, expected {expected:?}")]
    ParentMismatch {
        child: NodeId,
        expected: Option<NodeId>,
        found: Option<NodeId>,
    },

    #[error("bounds of node {0:?} do not enclose its children")]
    LooseBounds(NodeId),

    #[error("object {0} is held by more than one leaf")]
    DuplicateLeaf(String),

    #[error("object {0} has a leaf but is not tracked")]
    UntrackedLeaf(String),

    #[error("tracking {tracked} objects but found {leaves} leaves")]
    LeafCountMismatch { tracked: usize, leaves: usize },

    #[error("{reachable} nodes reachable but {allocated} allocated")]
    OrphanedNodes { reachable: usize, allocated: usize },
}

/// Result type for scene index operations
pub type Result<T> = std::result::Result<T, SpatialError>;
