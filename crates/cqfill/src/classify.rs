//! Rule classification
//!
//! Finds the rules that need emulation: style rules declaring layout
//! containment through the containment custom property, and `@media` rules
//! whose media text starts with a container marker.

use cqfill_css::{CssRule, RuleId, RuleParent, StyleSheet};

use crate::Config;

/// Axes a container is size-contained in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContainmentAxes {
    pub inline: bool,
    pub block: bool,
}

impl ContainmentAxes {
    pub const NONE: Self = Self { inline: false, block: false };
    pub const INLINE: Self = Self { inline: true, block: false };
    pub const BLOCK: Self = Self { inline: false, block: true };
    pub const BOTH: Self = Self { inline: true, block: true };

    /// Axes from a containment value such as `layout inline-size`.
    /// Without `layout` nothing is contained.
    pub fn from_contain_value(value: &str) -> Self {
        let tokens: Vec<String> = value.split_whitespace().map(str::to_ascii_lowercase).collect();
        let has = |keyword: &str| tokens.iter().any(|t| t == keyword);

        if !has("layout") {
            return Self::NONE;
        }
        let size = has("size");
        Self {
            inline: size || has("inline-size"),
            block: size || has("block-size"),
        }
    }

    pub fn is_empty(self) -> bool {
        !self.inline && !self.block
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            inline: self.inline || other.inline,
            block: self.block || other.block,
        }
    }
}

/// Classification of a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleClass {
    /// Style rule declaring size containment
    Containment(ContainmentAxes),
    /// `@media` rule carrying a rewritten container query
    ContainerQuery,
    Ordinary,
}

/// Classify one rule
pub fn classify(sheet: &StyleSheet, rule: RuleId, config: &Config) -> RuleClass {
    match sheet.rule(rule) {
        Some(CssRule::Style(style)) => {
            let value = style.style().get_property_value(&config.contain_property);
            let axes = ContainmentAxes::from_contain_value(value);
            if axes.is_empty() { RuleClass::Ordinary } else { RuleClass::Containment(axes) }
        }
        Some(CssRule::Media(media)) if config.is_container_media(media.condition_text()) => {
            RuleClass::ContainerQuery
        }
        _ => RuleClass::Ordinary,
    }
}

/// Containment rules, children before their parents.
///
/// `skip` excludes rules (and their subtrees) from the walk.
pub fn containment_rules(
    sheet: &StyleSheet,
    config: &Config,
    skip: &dyn Fn(RuleId) -> bool,
) -> Vec<(RuleId, ContainmentAxes)> {
    let mut found = Vec::new();
    walk_post_order(sheet, RuleParent::Sheet, skip, &mut |rule| {
        if let RuleClass::Containment(axes) = classify(sheet, rule, config) {
            found.push((rule, axes));
        }
    });
    found
}

/// Container query rules, parents before their children
pub fn container_query_rules(
    sheet: &StyleSheet,
    config: &Config,
    skip: &dyn Fn(RuleId) -> bool,
) -> Vec<RuleId> {
    let mut found = Vec::new();
    walk_pre_order(sheet, RuleParent::Sheet, skip, &mut |rule| {
        if classify(sheet, rule, config) == RuleClass::ContainerQuery {
            found.push(rule);
        }
    });
    found
}

fn walk_post_order(
    sheet: &StyleSheet,
    parent: RuleParent,
    skip: &dyn Fn(RuleId) -> bool,
    visit: &mut dyn FnMut(RuleId),
) {
    let Ok(rules) = sheet.css_rules(parent) else {
        return;
    };
    for &rule in rules {
        if skip(rule) {
            continue;
        }
        walk_post_order(sheet, RuleParent::Rule(rule), skip, visit);
        visit(rule);
    }
}

fn walk_pre_order(
    sheet: &StyleSheet,
    parent: RuleParent,
    skip: &dyn Fn(RuleId) -> bool,
    visit: &mut dyn FnMut(RuleId),
) {
    let Ok(rules) = sheet.css_rules(parent) else {
        return;
    };
    for &rule in rules {
        if skip(rule) {
            continue;
        }
        visit(rule);
        walk_pre_order(sheet, RuleParent::Rule(rule), skip, visit);
    }
}
