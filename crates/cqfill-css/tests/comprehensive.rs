//! Comprehensive tests for cqfill-css
//!
//! Tests the object model through parsing, mutation and selector queries.

use cqfill_css::{
    CssError, CssRule, Length, LengthUnit, MediaList, RuleParent, SelectorList, StyleSheet,
    parse_stylesheet, query_selector_all,
};
use cqfill_dom::{DomTree, NodeId};

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_empty() {
    let sheet = parse_stylesheet("").unwrap();
    assert_eq!(sheet.len(), 0);
    assert_eq!(sheet.to_css(), "");
}

#[test]
fn test_parse_multiple_rules() {
    let css = r#"
        .foo { color: red; }
        .bar { background: blue; }
        #baz { display: flex; }
    "#;
    let sheet = parse_stylesheet(css).unwrap();
    assert_eq!(sheet.len(), 3);
}

#[test]
fn test_parse_transformed_container_syntax() {
    let css = r#"
        .grid { --css-contain: layout inline-size; }
        @media --css-container and (min-width: 400px) {
            .card { color: red; }
        }
        @media \@container (max-width:20em) {
            .card { color: blue; }
        }
    "#;
    let sheet = parse_stylesheet(css).unwrap();
    assert_eq!(sheet.len(), 3);

    let media: Vec<String> = sheet
        .rules()
        .iter()
        .filter_map(|&id| sheet.rule(id).and_then(CssRule::media))
        .map(|m| m.media_text())
        .collect();
    assert_eq!(media, vec!["--css-container and (min-width: 400px)", "\\@container (max-width:20em)"]);
}

#[test]
fn test_parse_supports_and_nested_groups() {
    let css = "@supports (display: grid) { @media screen { .a { color: red } } }";
    let sheet = parse_stylesheet(css).unwrap();
    let supports = sheet.rules()[0];
    assert!(matches!(sheet.rule(supports), Some(CssRule::Supports(_))));

    let media = sheet.css_rules(RuleParent::Rule(supports)).unwrap()[0];
    let inner = sheet.css_rules(RuleParent::Rule(media)).unwrap();
    assert_eq!(sheet.selector_text(inner[0]), Some(".a"));
}

#[test]
fn test_parse_unclosed_block_closes_at_end() {
    let sheet = parse_stylesheet(".a { color: red").unwrap();
    let rule = sheet.rules()[0];
    assert_eq!(sheet.css_text(rule).as_deref(), Some(".a { color: red; }"));
}

#[test]
fn test_parse_rejects_rule_without_block() {
    assert!(matches!(parse_stylesheet(".a { }\n.b"), Err(CssError::ParseError { line: 2, .. })));
}

#[test]
fn test_quoted_selector_whitespace_survives() {
    let mut sheet = parse_stylesheet("[title=\"a  b\"]  .c { }").unwrap();
    let rule = sheet.rules()[0];
    assert_eq!(sheet.selector_text(rule), Some("[title=\"a  b\"] .c"));

    sheet.set_selector_text(rule, "  [title='x   y']\n> .d ").unwrap();
    assert_eq!(sheet.selector_text(rule), Some("[title='x   y'] > .d"));
}

// ============================================================================
// Mutation
// ============================================================================

#[test]
fn test_insert_inside_group_preserves_order() {
    let mut sheet = parse_stylesheet("@media all { .a { } .b { } }").unwrap();
    let media = RuleParent::Rule(sheet.rules()[0]);
    let b = sheet.css_rules(media).unwrap()[1];

    let inserted = sheet.insert_rule(media, ".z { color: red; }", 1).unwrap();
    assert_eq!(sheet.index_of(inserted), Some(1));
    assert_eq!(sheet.index_of(b), Some(2));
}

#[test]
fn test_insert_rejects_invalid_text() {
    let mut sheet = StyleSheet::new();
    assert!(sheet.insert_rule(RuleParent::Sheet, "not a rule", 0).is_err());
    assert!(sheet.insert_rule(RuleParent::Sheet, "", 0).is_err());
    assert!(sheet.is_empty());
}

#[test]
fn test_generation_tracks_writes_only() {
    let mut sheet = parse_stylesheet(".a { }").unwrap();
    let rule = sheet.rules()[0];
    let start = sheet.generation();

    let _ = sheet.css_text(rule);
    let _ = sheet.index_of(rule);
    assert_eq!(sheet.generation(), start);

    sheet.set_selector_text(rule, ":not(*)").unwrap();
    assert!(sheet.generation().is_newer_than(start));
}

#[test]
fn test_href() {
    let sheet = StyleSheet::new().with_href("https://example.com/site.css");
    assert_eq!(sheet.href(), Some("https://example.com/site.css"));
    assert_eq!(StyleSheet::new().href(), None);
}

// ============================================================================
// Selectors
// ============================================================================

fn list_document() -> (DomTree, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let html = tree.create_element("html");
    let body = tree.create_element("body");
    let ul = tree.create_element("ul");
    tree.append_child(NodeId::ROOT, html).unwrap();
    tree.append_child(html, body).unwrap();
    tree.append_child(body, ul).unwrap();

    let mut items = Vec::new();
    for i in 0..5 {
        let li = tree.create_element("li");
        tree.set_attribute(li, "data-index", &i.to_string()).unwrap();
        tree.append_child(ul, li).unwrap();
        items.push(li);
    }
    (tree, items)
}

#[test]
fn test_nth_child_queries() {
    let (tree, items) = list_document();
    let odd = SelectorList::parse("li:nth-child(odd)").unwrap();
    assert_eq!(query_selector_all(&tree, NodeId::ROOT, &odd), vec![items[0], items[2], items[4]]);

    let last_two = SelectorList::parse("li:nth-last-child(-n+2)").unwrap();
    assert_eq!(query_selector_all(&tree, NodeId::ROOT, &last_two), vec![items[3], items[4]]);
}

#[test]
fn test_attribute_queries() {
    let (tree, items) = list_document();
    let list = SelectorList::parse("[data-index=\"3\"], [data-index^='4']").unwrap();
    assert_eq!(query_selector_all(&tree, NodeId::ROOT, &list), vec![items[3], items[4]]);
}

#[test]
fn test_first_last_only() {
    let (tree, items) = list_document();
    let list = SelectorList::parse("li:first-child, li:last-of-type").unwrap();
    assert_eq!(query_selector_all(&tree, NodeId::ROOT, &list), vec![items[0], items[4]]);

    let only = SelectorList::parse("ul:only-child").unwrap();
    assert_eq!(query_selector_all(&tree, NodeId::ROOT, &only).len(), 1);
}

#[test]
fn test_text_nodes_do_not_affect_positions() {
    let (mut tree, items) = list_document();
    let ul = tree.parent(items[0]).unwrap();
    let text = tree.create_text("\n  ");
    tree.insert_before(ul, text, Some(items[0])).unwrap();

    let first = SelectorList::parse(":root > :nth-child(1) > :nth-child(1) > :nth-child(1)").unwrap();
    assert_eq!(query_selector_all(&tree, NodeId::ROOT, &first), vec![items[0]]);
}

#[test]
fn test_results_are_in_document_order() {
    let (tree, items) = list_document();
    let list = SelectorList::parse("[data-index='4'], [data-index='1']").unwrap();
    assert_eq!(query_selector_all(&tree, NodeId::ROOT, &list), vec![items[1], items[4]]);
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_length_and_media_helpers() {
    assert_eq!(Length::parse("700px"), Some(Length::new(700.0, LengthUnit::Px)));
    let media = MediaList::parse("\\@container (min-width:700px)");
    assert_eq!(media.get(0), Some("\\@container (min-width:700px)"));
}
