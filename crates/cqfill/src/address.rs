//! Structural element addresses
//!
//! An address is a selector naming exactly one element by its position:
//! `:root > :nth-child(2) > :nth-child(1)`. Positions shift with every
//! structural mutation, so addresses are always recomputed, never cached.

use cqfill_dom::{DomTree, NodeId};

/// Selector that matches no element
pub const ALWAYS_FALSE: &str = ":not(*)";

/// Address of a connected element, `None` for detached nodes and non-elements
pub fn element_address(tree: &DomTree, node: NodeId) -> Option<String> {
    tree.element(node)?;
    if !tree.is_connected(node) {
        return None;
    }

    let mut steps = Vec::new();
    let mut current = node;
    while let Some(parent) = tree.parent_element(current) {
        steps.push(tree.element_index(current)?);
        current = parent;
    }

    let mut address = String::from(":root");
    for step in steps.iter().rev() {
        address.push_str(&format!(" > :nth-child({})", step));
    }
    Some(address)
}

/// `:where(a,b,…)`, or the always-false selector for an empty list
pub fn where_selector(addresses: &[String]) -> String {
    if addresses.is_empty() {
        ALWAYS_FALSE.to_string()
    } else {
        format!(":where({})", addresses.join(","))
    }
}

/// `:is(contained):where(a,b,…)`, or the always-false selector
pub fn scoped_selector(contained: &str, addresses: &[String]) -> String {
    if addresses.is_empty() {
        ALWAYS_FALSE.to_string()
    } else {
        format!(":is({}):where({})", contained, addresses.join(","))
    }
}
