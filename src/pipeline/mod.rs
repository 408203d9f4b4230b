//! Mount pipeline - wiring a root component to a concrete tree.
//!
//! [`mount`] validates the target, materializes the initial tree, and sets
//! up the per-mount scheduler that batches state changes into single
//! re-renders.

pub mod mount;

pub use mount::{MountCallback, MountHandle, SharedTree, mount};
