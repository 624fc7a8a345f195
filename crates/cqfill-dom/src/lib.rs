//! cqfill DOM - Document Object Model
//!
//! Arena-based element tree with the geometry, computed style and
//! observation primitives the polyfill runtime consumes.

mod node;
mod tree;
pub mod generation;
pub mod geometry;
pub mod observer;
pub mod style;

pub use node::{Attribute, ElementData, Node, NodeData};
pub use tree::{Children, Descendants, DomTree};
pub use generation::Generation;
pub use geometry::{BoxSize, DOMRect};
pub use observer::{
    MutationObserver, MutationObserverInit, MutationRecord, MutationType,
    ResizeObserver, ResizeObserverEntry,
};
pub use style::{ComputedStyle, Display};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM operation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Node {child:?} is not a child of {parent:?}")]
    NotFound { parent: NodeId, child: NodeId },
}
