//! DOM Tree (arena-based allocation)
//!
//! All structural and attribute mutations go through `DomTree` so that each
//! one is journaled as a [`MutationRecord`]. Observers drain the journal;
//! see [`crate::observer`].

use crate::geometry::BoxSize;
use crate::observer::MutationRecord;
use crate::style::{DEFAULT_FONT_SIZE, Display};
use crate::{DomError, ElementData, Node, NodeData, NodeId};

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    journal: Vec<MutationRecord>,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            journal: Vec::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Get element data
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        let node = self.get_mut(id).ok_or(DomError::UnknownNode(id))?;
        node.as_element_mut().ok_or(DomError::NotAnElement(id))
    }

    /// Number of nodes ever allocated (detached ones included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its document node
    pub fn is_empty(&self) -> bool {
        false
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(Node::with_data(NodeData::Comment(content.to_string())))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or last when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotFound { parent, child: reference });
            }
            if reference == child {
                return Ok(());
            }
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }

        let next = reference.unwrap_or(NodeId::NONE);
        let prev = match reference {
            Some(r) => self.nodes[r.index()].prev_sibling,
            None => self.nodes[parent.index()].last_child,
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }

        self.journal.push(MutationRecord::child_list(
            parent,
            vec![child],
            Vec::new(),
            prev.is_valid().then_some(prev),
            next.is_valid().then_some(next),
        ));
        Ok(())
    }

    /// Detach `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.get(child).is_none() {
            return Err(DomError::UnknownNode(child));
        }
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound { parent, child });
        }

        let (prev, next) = {
            let node = &self.nodes[child.index()];
            (node.prev_sibling, node.next_sibling)
        };
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }
        {
            let node = &mut self.nodes[child.index()];
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }

        self.journal.push(MutationRecord::child_list(
            parent,
            Vec::new(),
            vec![child],
            prev.is_valid().then_some(prev),
            next.is_valid().then_some(next),
        ));
        Ok(())
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_node = self.get(parent).ok_or(DomError::UnknownNode(parent))?;
        let child_node = self.get(child).ok_or(DomError::UnknownNode(child))?;

        let parent_ok = matches!(parent_node.data, NodeData::Document | NodeData::Element(_));
        let child_ok = !matches!(child_node.data, NodeData::Document);
        if !parent_ok || !child_ok || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes & style
    // ------------------------------------------------------------------

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let old_value = self.element_mut(id)?.set_attr(name, value);
        self.journal
            .push(MutationRecord::attribute(id, &name.to_ascii_lowercase(), old_value));
        Ok(())
    }

    /// Remove an attribute from an element
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let old_value = self.element_mut(id)?.remove_attr(name);
        if old_value.is_some() {
            self.journal
                .push(MutationRecord::attribute(id, &name.to_ascii_lowercase(), old_value));
        }
        Ok(())
    }

    /// Override an element's display; journaled as a `style` attribute change
    pub fn set_display(&mut self, id: NodeId, display: Option<Display>) -> Result<(), DomError> {
        let style = &mut self.element_mut(id)?.style;
        let old = style.display.map(|d| d.as_str().to_string());
        style.display = display;
        self.journal.push(MutationRecord::attribute(id, "style", old));
        Ok(())
    }

    /// Override an element's font size; journaled as a `style` attribute change
    pub fn set_font_size(&mut self, id: NodeId, font_size: Option<f32>) -> Result<(), DomError> {
        let style = &mut self.element_mut(id)?.style;
        let old = style.font_size.map(|f| format!("{}px", f));
        style.font_size = font_size;
        self.journal.push(MutationRecord::attribute(id, "style", old));
        Ok(())
    }

    /// Record a layout result; geometry is not a DOM mutation
    pub fn set_content_box(&mut self, id: NodeId, size: BoxSize) -> Result<(), DomError> {
        self.element_mut(id)?.content_box = size;
        Ok(())
    }

    /// Content box from the last layout
    pub fn content_box(&self, id: NodeId) -> Option<BoxSize> {
        self.element(id).map(|e| e.content_box)
    }

    /// Computed display (explicit value or UA default)
    pub fn computed_display(&self, id: NodeId) -> Option<Display> {
        self.element(id)
            .map(|e| e.style.display.unwrap_or_else(|| Display::default_for_tag(&e.tag)))
    }

    /// Computed font size, inherited from the nearest ancestor that sets one
    pub fn computed_font_size(&self, id: NodeId) -> f32 {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(size) = self.element(node).and_then(|e| e.style.font_size) {
                return size;
            }
            current = self.parent_element(node);
        }
        DEFAULT_FONT_SIZE
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Parent node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Parent node if it is an element (the document node is not)
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.element(p).is_some())
    }

    /// Child nodes in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Element children in order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(move |&c| self.element(c).is_some())
    }

    /// Previous element sibling
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.prev_sibling;
        while current.is_valid() {
            if self.element(current).is_some() {
                return Some(current);
            }
            current = self.nodes[current.index()].prev_sibling;
        }
        None
    }

    /// 1-based position among the parent's element children
    pub fn element_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.element_children(parent).position(|c| c == id).map(|i| i + 1)
    }

    /// The `<html>`-equivalent element (first element child of the document)
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(NodeId::ROOT).next()
    }

    /// Pre-order descendants of `id`, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Pre-order element descendants of `id`, excluding `id` itself
    pub fn descendant_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(move |&n| self.element(n).is_some())
    }

    /// Inclusive ancestor check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether the node is attached to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(NodeId::ROOT, id)
    }

    // ------------------------------------------------------------------
    // Mutation journal
    // ------------------------------------------------------------------

    /// Drain journaled mutations
    pub fn take_mutation_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.journal)
    }

    /// Whether mutations are waiting to be delivered
    pub fn has_pending_mutations(&self) -> bool {
        !self.journal.is_empty()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over child nodes
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.nodes[current.index()].next_sibling;
        Some(current)
    }
}

/// Pre-order iterator bounded by a subtree root
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        let node = &self.tree.nodes[current.index()];

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            // Climb until a following sibling exists, never past the root
            let mut n = current;
            loop {
                if n == self.root {
                    break NodeId::NONE;
                }
                let up = &self.tree.nodes[n.index()];
                if up.next_sibling.is_valid() {
                    break up.next_sibling;
                }
                n = up.parent;
                if !n.is_valid() {
                    break NodeId::NONE;
                }
            }
        };
        Some(current)
    }
}
