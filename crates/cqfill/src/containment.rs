//! Layout containment emulation
//!
//! Every containment rule gets a synthesized `@media all` group inserted
//! right before it, holding one fallback rule for inline-level containers
//! (collapsed to `0%`) and one for block-level containers (`100%`). The
//! fallback selectors are rewritten to name the rule's current matches by
//! structural address.

use std::collections::BTreeMap;

use cqfill_css::{RuleId, RuleParent};
use cqfill_dom::{Display, NodeId};

use crate::address::{ALWAYS_FALSE, element_address, where_selector};
use crate::classify::ContainmentAxes;
use crate::document::{Document, RuleRef};
use crate::{EngineError, write_selector};

/// Identifies a registration within one polyfill context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub(crate) usize);

/// Elements currently acting as containers, with the axes they contain.
///
/// Each registration owns its own contribution; an element contributed by
/// several registrations carries the union of their axes.
#[derive(Debug, Clone, Default)]
pub struct ContainerSet {
    members: BTreeMap<NodeId, Vec<(RegistrationId, ContainmentAxes)>>,
}

impl ContainerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything `registration` contributed with `elements`
    pub fn replace_contribution(
        &mut self,
        registration: RegistrationId,
        axes: ContainmentAxes,
        elements: &[NodeId],
    ) {
        self.members.retain(|_, contributions| {
            contributions.retain(|(id, _)| *id != registration);
            !contributions.is_empty()
        });
        for &element in elements {
            self.members.entry(element).or_default().push((registration, axes));
        }
    }

    /// Combined axes of a container
    pub fn axes(&self, element: NodeId) -> Option<ContainmentAxes> {
        self.members.get(&element).map(|contributions| {
            contributions
                .iter()
                .fold(ContainmentAxes::NONE, |acc, (_, axes)| acc.union(*axes))
        })
    }

    pub fn contains(&self, element: NodeId) -> bool {
        self.members.contains_key(&element)
    }

    /// Containers with their combined axes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, ContainmentAxes)> + '_ {
        self.members.keys().filter_map(|&node| Some((node, self.axes(node)?)))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A containment rule under emulation
#[derive(Debug, Clone)]
pub struct ContainerRegistration {
    id: RegistrationId,
    origin: RuleRef,
    group: RuleRef,
    inline_fallback: RuleRef,
    block_fallback: RuleRef,
    axes: ContainmentAxes,
    last_matched: Vec<MatchedContainer>,
}

impl ContainerRegistration {
    /// Insert the fallback group before `origin`
    pub fn register(
        doc: &mut Document,
        id: RegistrationId,
        origin: RuleRef,
        axes: ContainmentAxes,
    ) -> Result<Self, EngineError> {
        let sheet = doc
            .style_sheet_mut(origin.sheet)
            .ok_or(EngineError::UnknownSheet(origin.sheet))?;
        let parent = sheet.parent_of(origin.rule).ok_or(EngineError::DetachedRule(origin))?;
        let index = sheet.index_of(origin.rule).ok_or(EngineError::DetachedRule(origin))?;

        let group = sheet.insert_rule(parent, &fallback_group_text(axes), index)?;
        let (inline_fallback, block_fallback) = match sheet.css_rules(RuleParent::Rule(group))? {
            &[inline, block] => (inline, block),
            _ => return Err(EngineError::MalformedFallback(origin)),
        };

        tracing::debug!(
            "Registered container rule {:?} ({:?}) at index {}",
            sheet.selector_text(origin.rule).unwrap_or_default(),
            axes,
            index
        );

        let at = |rule: RuleId| RuleRef { sheet: origin.sheet, rule };
        Ok(Self {
            id,
            origin,
            group: at(group),
            inline_fallback: at(inline_fallback),
            block_fallback: at(block_fallback),
            axes,
            last_matched: Vec::new(),
        })
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    /// The author rule declaring containment
    pub fn origin(&self) -> RuleRef {
        self.origin
    }

    /// Synthesized `@media all` group
    pub fn group(&self) -> RuleRef {
        self.group
    }

    /// Fallback for inline-level containers
    pub fn inline_fallback(&self) -> RuleRef {
        self.inline_fallback
    }

    /// Fallback for block-level containers
    pub fn block_fallback(&self) -> RuleRef {
        self.block_fallback
    }

    pub fn axes(&self) -> ContainmentAxes {
        self.axes
    }

    /// Elements matched at the last update, in document order
    pub fn last_matched(&self) -> Vec<NodeId> {
        self.last_matched.iter().map(|m| m.element).collect()
    }

    /// Re-match the origin selector. When the matched elements, their
    /// addresses or their display partition changed, rewrites both fallback
    /// selectors and this rule's container contribution. Returns whether
    /// anything changed.
    pub fn update(&mut self, doc: &mut Document, containers: &mut ContainerSet) -> Result<bool, EngineError> {
        let selector = doc
            .selector_text(self.origin)
            .ok_or(EngineError::DetachedRule(self.origin))?
            .to_string();
        let elements = doc.query_selector_all(NodeId::ROOT, &selector)?;

        let snapshot: Vec<MatchedContainer> = elements
            .iter()
            .filter_map(|&element| {
                Some(MatchedContainer {
                    element,
                    address: element_address(&doc.tree, element)?,
                    inline_level: doc
                        .tree
                        .computed_display(element)
                        .is_some_and(Display::is_inline_level),
                })
            })
            .collect();
        if snapshot == self.last_matched {
            return Ok(false);
        }

        containers.replace_contribution(self.id, self.axes, &elements);

        let (inline, block): (Vec<&MatchedContainer>, Vec<&MatchedContainer>) =
            snapshot.iter().partition(|m| m.inline_level);
        let addresses = |group: &[&MatchedContainer]| -> Vec<String> {
            group.iter().map(|m| m.address.clone()).collect()
        };
        write_selector(doc, self.inline_fallback, &where_selector(&addresses(&inline)))?;
        write_selector(doc, self.block_fallback, &where_selector(&addresses(&block)))?;

        tracing::trace!(
            "{:?}: {} containers ({} inline, {} block)",
            selector,
            snapshot.len(),
            inline.len(),
            block.len()
        );
        self.last_matched = snapshot;
        Ok(true)
    }
}

/// One matched element as seen at the last update
#[derive(Debug, Clone, PartialEq, Eq)]
struct MatchedContainer {
    element: NodeId,
    address: String,
    inline_level: bool,
}

/// `@media all{…}` with the inline-display and block-display fallbacks
pub fn fallback_group_text(axes: ContainmentAxes) -> String {
    let fallback = |extent: &str| {
        let mut text = format!("{}{{transform:scale3d(1,1,1);", ALWAYS_FALSE);
        if axes.inline {
            text.push_str(&format!("inline-size:{};", extent));
        }
        if axes.block {
            text.push_str(&format!("block-size:{};", extent));
        }
        text.push('}');
        text
    };
    format!("@media all{{{}{}}}", fallback("0%"), fallback("100%"))
}
