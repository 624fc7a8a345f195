//! DOM Observers
//!
//! MutationObserver and ResizeObserver. Both are pull-based: the tree
//! journals mutations and stores layout sizes, and the owner of an observer
//! decides when to collect notifications.

use crate::geometry::{BoxSize, DOMRect};
use crate::{DomTree, NodeId};

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    /// Child list change on `target`
    pub fn child_list(
        target: NodeId,
        added_nodes: Vec<NodeId>,
        removed_nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes,
            removed_nodes,
            previous_sibling,
            next_sibling,
            attribute_name: None,
            old_value: None,
        }
    }

    /// Attribute change on `target`
    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Attributes, child list and subtree: everything structural
    pub fn subtree_all() -> Self {
        Self {
            child_list: true,
            attributes: true,
            subtree: true,
            ..Default::default()
        }
    }
}

/// Mutation observer
#[derive(Debug, Default)]
pub struct MutationObserver {
    observations: Vec<(NodeId, MutationObserverInit)>,
    pending_records: Vec<MutationRecord>,
}

impl MutationObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a target; observing it again replaces its options
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) {
        match self.observations.iter_mut().find(|(t, _)| *t == target) {
            Some(entry) => entry.1 = options,
            None => self.observations.push((target, options)),
        }
    }

    /// Stop observing everything
    pub fn disconnect(&mut self) {
        self.observations.clear();
        self.pending_records.clear();
    }

    /// Check if observing node
    pub fn is_observing(&self, node: NodeId) -> bool {
        self.observations.iter().any(|(t, _)| *t == node)
    }

    /// Queue every record this observer is interested in; returns how many
    pub fn deliver(&mut self, tree: &DomTree, records: &[MutationRecord]) -> usize {
        let before = self.pending_records.len();
        for record in records {
            if self.wants(tree, record) {
                self.pending_records.push(record.clone());
            }
        }
        let queued = self.pending_records.len() - before;
        tracing::trace!("MutationObserver queued {} of {} records", queued, records.len());
        queued
    }

    fn wants(&self, tree: &DomTree, record: &MutationRecord) -> bool {
        self.observations.iter().any(|(target, options)| {
            let matches_target = *target == record.target
                || (options.subtree && tree.contains(*target, record.target));
            let matches_type = match record.mutation_type {
                MutationType::Attributes => options.attributes,
                MutationType::CharacterData => options.character_data,
                MutationType::ChildList => options.child_list,
            };
            let passes_filter = match (&options.attribute_filter, &record.attribute_name) {
                (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                _ => true,
            };

            matches_target && matches_type && passes_filter
        })
    }

    /// Take pending records
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending_records)
    }

    /// Has pending records
    pub fn has_pending(&self) -> bool {
        !self.pending_records.is_empty()
    }
}

/// Resize observer entry
#[derive(Debug, Clone)]
pub struct ResizeObserverEntry {
    pub target: NodeId,
    pub content_rect: DOMRect,
    pub content_box_size: BoxSize,
}

#[derive(Debug)]
struct ObservedElement {
    target: NodeId,
    last_size: Option<BoxSize>,
}

/// Resize observer
///
/// A freshly observed element always reports once, matching the platform
/// behavior of delivering an initial observation.
#[derive(Debug, Default)]
pub struct ResizeObserver {
    observed: Vec<ObservedElement>,
}

impl ResizeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe an element; observing twice is a no-op
    pub fn observe(&mut self, target: NodeId) {
        if !self.is_observing(target) {
            self.observed.push(ObservedElement { target, last_size: None });
        }
    }

    /// Stop observing an element
    pub fn unobserve(&mut self, target: NodeId) {
        self.observed.retain(|o| o.target != target);
    }

    /// Disconnect all observations
    pub fn disconnect(&mut self) {
        tracing::trace!("ResizeObserver disconnected from {} elements", self.observed.len());
        self.observed.clear();
    }

    /// Check if observing node
    pub fn is_observing(&self, target: NodeId) -> bool {
        self.observed.iter().any(|o| o.target == target)
    }

    /// Number of observed elements
    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Compare current content boxes against the last reported ones
    pub fn check_sizes(&mut self, tree: &DomTree) -> Vec<ResizeObserverEntry> {
        let mut entries = Vec::new();
        for observed in &mut self.observed {
            // Disconnected elements have no box
            let size = if tree.is_connected(observed.target) {
                tree.content_box(observed.target).unwrap_or_default()
            } else {
                BoxSize::default()
            };

            let changed = match observed.last_size {
                Some(last) => last.differs_from(&size),
                None => true,
            };
            if changed {
                observed.last_size = Some(size);
                entries.push(ResizeObserverEntry {
                    target: observed.target,
                    content_rect: size.to_rect(),
                    content_box_size: size,
                });
            }
        }
        if !entries.is_empty() {
            tracing::trace!("ResizeObserver: {} size changes", entries.len());
        }
        entries
    }
}
