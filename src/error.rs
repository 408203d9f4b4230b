//! Error types.

use thiserror::Error;

use crate::types::NodeId;

/// Failures raised synchronously by [`crate::pipeline::mount`] before any
/// tree work begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    /// The mount target is not a live node of the given tree.
    #[error("mount target {0} is not a node of the target tree")]
    UnknownRoot(NodeId),
    /// The mount target cannot hold children.
    #[error("mount target {0} is not an element")]
    RootNotElement(NodeId),
}
