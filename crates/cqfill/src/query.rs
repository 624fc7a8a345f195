//! Container query compilation
//!
//! Turns a rewritten container query such as
//! `@media --css-container and (min-width: 400px)` into a size predicate
//! plus one always-false substitute rule per inner style rule. The
//! evaluation loop later points each substitute at the matching elements.

use cqfill_css::{CssRule, Length, LengthUnit, MediaList, ResolutionContext, RuleId, RuleParent};
use cqfill_dom::{BoxSize, NodeId};

use crate::address::ALWAYS_FALSE;
use crate::classify::ContainmentAxes;
use crate::config::{Config, ThresholdResolution};
use crate::document::{Document, RuleRef};
use crate::EngineError;

/// Query direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryBound {
    /// `min-*`: extent >= threshold
    Min,
    /// `max-*`: extent <= threshold
    Max,
}

/// Queried dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAxis {
    /// Inline extent; needs inline-axis containment
    Width,
    /// Block extent; needs block-axis containment
    Height,
}

/// Parsed `(min|max)-(width|height): <length>` condition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePredicate {
    pub bound: QueryBound,
    pub axis: QueryAxis,
    pub threshold: Length,
}

impl SizePredicate {
    /// Parse the first medium of a media condition. `None` when the
    /// condition has no size feature, or its threshold is a percentage or
    /// uses an unknown unit.
    pub fn parse(condition_text: &str) -> Option<Self> {
        let media = MediaList::parse(condition_text);
        let medium = media.get(0)?;

        medium
            .match_indices('(')
            .find_map(|(open, _)| parse_feature(&medium[open + 1..]))
            .filter(|predicate| predicate.threshold.unit != LengthUnit::Percent)
    }

    /// Threshold in px
    pub fn resolve(&self, ctx: &ResolutionContext) -> Option<f32> {
        self.threshold.to_px(ctx)
    }

    /// Whether a container of `size`, contained in `axes`, satisfies the
    /// predicate against `threshold_px`
    pub fn holds(&self, size: BoxSize, axes: ContainmentAxes, threshold_px: f32) -> bool {
        let (contained, extent) = match self.axis {
            QueryAxis::Width => (axes.inline, size.inline_size),
            QueryAxis::Height => (axes.block, size.block_size),
        };
        contained
            && match self.bound {
                QueryBound::Min => extent >= threshold_px,
                QueryBound::Max => extent <= threshold_px,
            }
    }
}

/// `min-width: 400px)` (text following an opening parenthesis)
fn parse_feature(text: &str) -> Option<SizePredicate> {
    let text = text.trim_start();
    let (name, rest) = text.split_once(':')?;

    let (bound, axis) = name.trim_end().to_ascii_lowercase().split_once('-').and_then(|(b, a)| {
        let bound = match b {
            "min" => QueryBound::Min,
            "max" => QueryBound::Max,
            _ => return None,
        };
        let axis = match a {
            "width" => QueryAxis::Width,
            "height" => QueryAxis::Height,
            _ => return None,
        };
        Some((bound, axis))
    })?;

    let rest = rest.trim_start();
    let value_end = rest.find(|c: char| c.is_whitespace() || c == ')')?;
    let (value, tail) = rest.split_at(value_end);
    if !tail.trim_start().starts_with(')') {
        return None;
    }

    Some(SizePredicate { bound, axis, threshold: Length::parse(value)? })
}

/// A substitute rule driven by a size predicate
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// Selector of the inner rule the substitute stands in for
    pub contained: String,
    /// Synthesized rule whose selector the evaluation loop rewrites
    pub substitute: RuleRef,
    pub predicate: SizePredicate,
    /// Threshold frozen at compile time, when resolving once
    pub frozen_threshold: Option<f32>,
}

impl CompiledQuery {
    /// Threshold in px for a given container
    pub fn threshold_for(&self, doc: &Document, container: NodeId, config: &Config) -> Option<f32> {
        match self.frozen_threshold {
            Some(px) => Some(px),
            None => self.predicate.resolve(&resolution_context(doc, Some(container), config)),
        }
    }
}

/// Resolution inputs for `element` (or the root element when `None`)
pub fn resolution_context(doc: &Document, element: Option<NodeId>, config: &Config) -> ResolutionContext {
    let root_font_size = doc.root_font_size(config.default_font_size);
    ResolutionContext {
        font_size: element.map(|e| doc.tree.computed_font_size(e)).unwrap_or(root_font_size),
        root_font_size,
        viewport_width: doc.viewport.width,
        viewport_height: doc.viewport.height,
    }
}

/// Result of compiling one container query rule
#[derive(Debug, Clone)]
pub struct CompiledContainerRule {
    /// Synthesized `@media all` group holding the substitutes
    pub group: RuleRef,
    pub queries: Vec<CompiledQuery>,
}

/// Compile a container query rule, inserting its substitute group right
/// before it. `Ok(None)` leaves the rule to native behavior.
pub fn compile_container_rule(
    doc: &mut Document,
    origin: RuleRef,
    config: &Config,
) -> Result<Option<CompiledContainerRule>, EngineError> {
    let condition = {
        let sheet = doc.style_sheet(origin.sheet).ok_or(EngineError::UnknownSheet(origin.sheet))?;
        match sheet.rule(origin.rule) {
            Some(CssRule::Media(media)) => media.condition_text().to_string(),
            _ => return Err(EngineError::DetachedRule(origin)),
        }
    };

    let Some(predicate) = SizePredicate::parse(&condition) else {
        tracing::debug!("Container condition {:?} is not emulable", condition);
        return Ok(None);
    };

    let frozen_threshold = match config.threshold_resolution {
        ThresholdResolution::Activation => {
            let Some(px) = predicate.resolve(&resolution_context(doc, None, config)) else {
                return Ok(None);
            };
            Some(px)
        }
        ThresholdResolution::EveryCycle => None,
    };

    let sheet = doc
        .style_sheet_mut(origin.sheet)
        .ok_or(EngineError::UnknownSheet(origin.sheet))?;
    let parent = sheet.parent_of(origin.rule).ok_or(EngineError::DetachedRule(origin))?;
    let index = sheet.index_of(origin.rule).ok_or(EngineError::DetachedRule(origin))?;

    // Snapshot inner rules before inserting anything
    let inner: Vec<(String, String)> = sheet
        .css_rules(RuleParent::Rule(origin.rule))?
        .iter()
        .filter_map(|&id| sheet.rule(id)?.as_style())
        .map(|style| (style.selector_text().to_string(), style.style().css_text()))
        .collect();

    let group = sheet.insert_rule(parent, "@media all{}", index)?;
    let at = |rule: RuleId| RuleRef { sheet: origin.sheet, rule };

    let mut queries = Vec::with_capacity(inner.len());
    for (position, (contained, declarations)) in inner.into_iter().enumerate() {
        let text = format!("{}{{{}}}", ALWAYS_FALSE, declarations);
        let substitute = sheet.insert_rule(RuleParent::Rule(group), &text, position)?;
        queries.push(CompiledQuery {
            contained,
            substitute: at(substitute),
            predicate,
            frozen_threshold,
        });
    }

    tracing::debug!(
        "Compiled container query {:?} into {} substitute rules",
        condition,
        queries.len()
    );
    Ok(Some(CompiledContainerRule { group: at(group), queries }))
}
