//! Query evaluation loop
//!
//! Points each compiled query's substitute rule at the descendants of the
//! containers currently satisfying its predicate.

use std::collections::HashSet;

use cqfill_dom::NodeId;

use crate::address::{element_address, scoped_selector};
use crate::containment::ContainerSet;
use crate::document::Document;
use crate::query::CompiledQuery;
use crate::{Config, EngineError, write_selector};

/// Re-evaluate every query; returns how many substitute selectors were
/// rewritten. A failing query is logged and skipped.
pub fn reevaluate(
    doc: &mut Document,
    queries: &[CompiledQuery],
    containers: &ContainerSet,
    config: &Config,
) -> usize {
    let mut written = 0;
    for query in queries {
        match evaluate_query(doc, query, containers, config) {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!("Container query for {:?} failed: {}", query.contained, e),
        }
    }
    if written > 0 {
        tracing::trace!("Re-evaluated {} queries, {} selectors rewritten", queries.len(), written);
    }
    written
}

/// Evaluate one query; returns whether its selector changed
pub fn evaluate_query(
    doc: &mut Document,
    query: &CompiledQuery,
    containers: &ContainerSet,
    config: &Config,
) -> Result<bool, EngineError> {
    let selector = query_selector(doc, query, containers, config)?;
    write_selector(doc, query.substitute, &selector)
}

/// Selector the substitute rule should carry right now
pub fn query_selector(
    doc: &Document,
    query: &CompiledQuery,
    containers: &ContainerSet,
    config: &Config,
) -> Result<String, EngineError> {
    let mut fulfilled = HashSet::new();
    for (container, axes) in containers.iter() {
        if !doc.tree.is_connected(container) {
            continue;
        }
        let Some(threshold) = query.threshold_for(doc, container, config) else {
            continue;
        };
        let size = doc.tree.content_box(container).unwrap_or_default();
        if query.predicate.holds(size, axes, threshold) {
            fulfilled.extend(doc.query_selector_all(container, &query.contained)?);
        }
    }

    // Document order keeps the selector stable across cycles
    let addresses: Vec<String> = if fulfilled.is_empty() {
        Vec::new()
    } else {
        doc.tree
            .descendant_elements(NodeId::ROOT)
            .filter(|node| fulfilled.contains(node))
            .filter_map(|node| element_address(&doc.tree, node))
            .collect()
    };
    Ok(scoped_selector(&query.contained, &addresses))
}
