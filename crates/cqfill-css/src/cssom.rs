//! CSS Object Model
//!
//! A live, mutable style sheet. Rules live in an arena and are addressed by
//! [`RuleId`], which stays valid across insertions and deletions elsewhere in
//! the sheet; a rule's index among its siblings is computed on demand.

use cqfill_dom::Generation;

use crate::CssError;
use crate::media::MediaList;
use crate::parser::{self, CssParser, ParsedRule};
use crate::selectors::SelectorList;

/// Stable rule handle within one [`StyleSheet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a rule list lives: the sheet itself or a grouping rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleParent {
    Sheet,
    Rule(RuleId),
}

/// Single declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// Ordered declarations of a style rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationBlock {
    declarations: Vec<Declaration>,
}

impl DeclarationBlock {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    /// Value of the last declaration of `name`, or `""` like `getPropertyValue`
    pub fn get_property_value(&self, name: &str) -> &str {
        self.find(name).map(|d| d.value.as_str()).unwrap_or("")
    }

    /// Value of the last declaration of `name`
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        let custom = name.starts_with("--");
        self.declarations.iter().rev().find(|d| {
            if custom { d.name == name } else { d.name.eq_ignore_ascii_case(name) }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialized body, e.g. `color: red; margin: 0 !important;`
    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.name, d.value)
                } else {
                    format!("{}: {};", d.name, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Style rule (`selector { declarations }`)
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    selector_text: String,
    style: DeclarationBlock,
}

impl StyleRule {
    pub fn selector_text(&self) -> &str {
        &self.selector_text
    }

    pub fn style(&self) -> &DeclarationBlock {
        &self.style
    }
}

/// `@media` or `@supports` rule holding child rules
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingRule {
    condition_text: String,
    rules: Vec<RuleId>,
}

impl GroupingRule {
    pub fn condition_text(&self) -> &str {
        &self.condition_text
    }

    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }
}

/// At-rule kept verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueRule {
    name: String,
    text: String,
}

impl OpaqueRule {
    /// At-keyword without `@`
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// CSS rule
#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    Style(StyleRule),
    Media(GroupingRule),
    Supports(GroupingRule),
    Opaque(OpaqueRule),
}

impl CssRule {
    pub fn as_style(&self) -> Option<&StyleRule> {
        match self {
            Self::Style(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_grouping(&self) -> Option<&GroupingRule> {
        match self {
            Self::Media(rule) | Self::Supports(rule) => Some(rule),
            _ => None,
        }
    }

    /// Media list of a `@media` rule
    pub fn media(&self) -> Option<MediaList> {
        match self {
            Self::Media(rule) => Some(MediaList::parse(&rule.condition_text)),
            _ => None,
        }
    }

    fn grouping_mut(&mut self) -> Option<&mut GroupingRule> {
        match self {
            Self::Media(rule) | Self::Supports(rule) => Some(rule),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct RuleSlot {
    /// `None` once deleted
    parent: Option<RuleParent>,
    rule: CssRule,
}

/// Live style sheet
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    href: Option<String>,
    top: Vec<RuleId>,
    slots: Vec<RuleSlot>,
    generation: Generation,
}

impl StyleSheet {
    /// Empty inline sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse style sheet text
    pub fn parse(css: &str) -> Result<Self, CssError> {
        let parsed = CssParser::new().parse(css)?;
        let mut sheet = Self::new();
        for rule in parsed {
            let id = sheet.materialize(rule, RuleParent::Sheet);
            sheet.top.push(id);
        }
        tracing::debug!("Parsed style sheet with {} top-level rules", sheet.top.len());
        Ok(sheet)
    }

    /// Mark the sheet as loaded from `href`
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Counter bumped by every mutation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Top-level rules
    pub fn rules(&self) -> &[RuleId] {
        &self.top
    }

    /// Number of top-level rules
    pub fn len(&self) -> usize {
        self.top.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }

    /// Child rules of `parent`
    pub fn css_rules(&self, parent: RuleParent) -> Result<&[RuleId], CssError> {
        match parent {
            RuleParent::Sheet => Ok(&self.top),
            RuleParent::Rule(id) => self
                .rule(id)
                .ok_or(CssError::UnknownRule(id))?
                .as_grouping()
                .map(GroupingRule::rules)
                .ok_or(CssError::NotAGroupingRule(id)),
        }
    }

    /// Live rule by id
    pub fn rule(&self, id: RuleId) -> Option<&CssRule> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.parent.is_some())
            .map(|slot| &slot.rule)
    }

    /// Parent list of a live rule
    pub fn parent_of(&self, id: RuleId) -> Option<RuleParent> {
        self.slots.get(id.index()).and_then(|slot| slot.parent)
    }

    /// Current index of a rule among its siblings
    pub fn index_of(&self, id: RuleId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.css_rules(parent).ok()?.iter().position(|&r| r == id)
    }

    /// Parse `text` as one rule and insert it at `index` of `parent`
    pub fn insert_rule(
        &mut self,
        parent: RuleParent,
        text: &str,
        index: usize,
    ) -> Result<RuleId, CssError> {
        let len = self.css_rules(parent)?.len();
        if index > len {
            return Err(CssError::IndexSize { index, len });
        }

        let parsed = CssParser::new().parse_rule(text)?;
        parser::validate_rule_text(text, 1)?;

        let id = self.materialize(parsed, parent);
        self.children_mut(parent)?.insert(index, id);
        self.generation.bump();
        tracing::trace!("Inserted rule {:?} at {:?}[{}]", id, parent, index);
        Ok(id)
    }

    /// Remove the rule at `index` of `parent`, together with its descendants
    pub fn delete_rule(&mut self, parent: RuleParent, index: usize) -> Result<(), CssError> {
        let len = self.css_rules(parent)?.len();
        if index >= len {
            return Err(CssError::IndexSize { index, len });
        }
        let id = self.children_mut(parent)?.remove(index);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(current.index()) {
                slot.parent = None;
                if let Some(group) = slot.rule.as_grouping() {
                    stack.extend_from_slice(&group.rules);
                }
            }
        }
        self.generation.bump();
        Ok(())
    }

    /// Selector of a style rule
    pub fn selector_text(&self, id: RuleId) -> Option<&str> {
        self.rule(id)?.as_style().map(StyleRule::selector_text)
    }

    /// Replace a style rule's selector; invalid text leaves the rule untouched
    pub fn set_selector_text(&mut self, id: RuleId, text: &str) -> Result<(), CssError> {
        match self.rule(id) {
            None => return Err(CssError::UnknownRule(id)),
            Some(rule) if rule.as_style().is_none() => return Err(CssError::NotAStyleRule(id)),
            Some(_) => {}
        }

        let text = parser::normalize_prelude(text);
        SelectorList::parse(&text)?;
        parser::validate_selector_text(&text)?;

        if let Some(CssRule::Style(style)) = self.slots.get_mut(id.index()).map(|s| &mut s.rule) {
            style.selector_text = text;
        }
        self.generation.bump();
        Ok(())
    }

    /// Serialized rule
    pub fn css_text(&self, id: RuleId) -> Option<String> {
        let rule = self.rule(id)?;
        Some(match rule {
            CssRule::Style(style) => {
                let body = style.style.css_text();
                if body.is_empty() {
                    format!("{} {{ }}", style.selector_text)
                } else {
                    format!("{} {{ {} }}", style.selector_text, body)
                }
            }
            CssRule::Media(group) | CssRule::Supports(group) => {
                let keyword = if matches!(rule, CssRule::Media(_)) { "media" } else { "supports" };
                let mut text = format!("@{} {} {{\n", keyword, group.condition_text);
                for &child in &group.rules {
                    if let Some(child_text) = self.css_text(child) {
                        for line in child_text.lines() {
                            text.push_str("  ");
                            text.push_str(line);
                            text.push('\n');
                        }
                    }
                }
                text.push('}');
                text
            }
            CssRule::Opaque(opaque) => opaque.text.clone(),
        })
    }

    /// Serialized sheet
    pub fn to_css(&self) -> String {
        self.top
            .iter()
            .filter_map(|&id| self.css_text(id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn children_mut(&mut self, parent: RuleParent) -> Result<&mut Vec<RuleId>, CssError> {
        match parent {
            RuleParent::Sheet => Ok(&mut self.top),
            RuleParent::Rule(id) => self
                .slots
                .get_mut(id.index())
                .filter(|slot| slot.parent.is_some())
                .ok_or(CssError::UnknownRule(id))?
                .rule
                .grouping_mut()
                .map(|group| &mut group.rules)
                .ok_or(CssError::NotAGroupingRule(id)),
        }
    }

    fn materialize(&mut self, parsed: ParsedRule, parent: RuleParent) -> RuleId {
        let id = RuleId(self.slots.len() as u32);
        let (rule, children) = match parsed {
            ParsedRule::Style { selector, declarations } => (
                CssRule::Style(StyleRule {
                    selector_text: selector,
                    style: DeclarationBlock::new(declarations),
                }),
                Vec::new(),
            ),
            ParsedRule::Media { condition, rules } => (
                CssRule::Media(GroupingRule { condition_text: condition, rules: Vec::new() }),
                rules,
            ),
            ParsedRule::Supports { condition, rules } => (
                CssRule::Supports(GroupingRule { condition_text: condition, rules: Vec::new() }),
                rules,
            ),
            ParsedRule::Opaque { name, text } => (CssRule::Opaque(OpaqueRule { name, text }), Vec::new()),
        };
        self.slots.push(RuleSlot { parent: Some(parent), rule });

        let child_ids: Vec<RuleId> = children
            .into_iter()
            .map(|child| self.materialize(child, RuleParent::Rule(id)))
            .collect();
        if let Some(group) = self.slots[id.index()].rule.grouping_mut() {
            group.rules = child_ids;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_index() {
        let sheet = StyleSheet::parse("a { color: red } @media print { b { } c { } } d { }").unwrap();
        assert_eq!(sheet.len(), 3);
        let media = sheet.rules()[1];
        let children = sheet.css_rules(RuleParent::Rule(media)).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(sheet.index_of(children[1]), Some(1));
        assert_eq!(sheet.parent_of(children[1]), Some(RuleParent::Rule(media)));
        assert_eq!(sheet.index_of(sheet.rules()[2]), Some(2));
    }

    #[test]
    fn test_insert_keeps_ids_stable() {
        let mut sheet = StyleSheet::parse(".a { } .b { }").unwrap();
        let b = sheet.rules()[1];
        let before = sheet.generation();

        let inserted = sheet.insert_rule(RuleParent::Sheet, "@media all{:not(*){color:red}}", 1).unwrap();
        assert_eq!(sheet.index_of(inserted), Some(1));
        assert_eq!(sheet.index_of(b), Some(2));
        assert_eq!(sheet.selector_text(b), Some(".b"));
        assert!(sheet.generation().is_newer_than(before));

        let inner = sheet.css_rules(RuleParent::Rule(inserted)).unwrap()[0];
        assert_eq!(sheet.selector_text(inner), Some(":not(*)"));
    }

    #[test]
    fn test_insert_errors() {
        let mut sheet = StyleSheet::parse(".a { }").unwrap();
        let a = sheet.rules()[0];
        assert!(matches!(
            sheet.insert_rule(RuleParent::Sheet, ".b { }", 5),
            Err(CssError::IndexSize { index: 5, len: 1 })
        ));
        assert!(matches!(
            sheet.insert_rule(RuleParent::Rule(a), ".b { }", 0),
            Err(CssError::NotAGroupingRule(_))
        ));
        assert!(sheet.insert_rule(RuleParent::Sheet, ".b { } .c { }", 0).is_err());
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_delete_rule() {
        let mut sheet = StyleSheet::parse("@media print { a { } } b { }").unwrap();
        let media = sheet.rules()[0];
        let inner = sheet.css_rules(RuleParent::Rule(media)).unwrap()[0];
        sheet.delete_rule(RuleParent::Sheet, 0).unwrap();
        assert_eq!(sheet.len(), 1);
        assert!(sheet.rule(media).is_none());
        assert!(sheet.rule(inner).is_none());
        assert!(sheet.delete_rule(RuleParent::Sheet, 1).is_err());
    }

    #[test]
    fn test_set_selector_text() {
        let mut sheet = StyleSheet::parse(".card { color: red }").unwrap();
        let rule = sheet.rules()[0];
        sheet.set_selector_text(rule, ":is(.card):where(:root > :nth-child(1))").unwrap();
        assert_eq!(sheet.selector_text(rule), Some(":is(.card):where(:root > :nth-child(1))"));

        let generation = sheet.generation();
        assert!(sheet.set_selector_text(rule, "a >").is_err());
        assert_eq!(sheet.generation(), generation);
        assert_eq!(sheet.selector_text(rule), Some(":is(.card):where(:root > :nth-child(1))"));
    }

    #[test]
    fn test_css_text() {
        let sheet = StyleSheet::parse("@media all { .a { color: red; margin: 0 !important } }").unwrap();
        let media = sheet.rules()[0];
        assert_eq!(
            sheet.css_text(media).unwrap(),
            "@media all {\n  .a { color: red; margin: 0 !important; }\n}"
        );
    }

    #[test]
    fn test_declaration_lookup() {
        let sheet = StyleSheet::parse(".a { --css-contain: layout size; color: red; COLOR: blue }").unwrap();
        let style = sheet.rule(sheet.rules()[0]).unwrap().as_style().unwrap().style();
        assert_eq!(style.get_property_value("--css-contain"), "layout size");
        assert_eq!(style.get_property_value("--CSS-CONTAIN"), "");
        assert_eq!(style.get_property_value("color"), "blue");
    }
}
