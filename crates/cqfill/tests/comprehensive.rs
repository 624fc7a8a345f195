//! Comprehensive tests for cqfill
//!
//! End-to-end behavior of the polyfill against the host document model.

use cqfill::{Config, Document, Polyfill, RuleRef, SheetId, ThresholdResolution};
use cqfill_css::{RuleParent, StyleSheet};
use cqfill_dom::{BoxSize, Display, NodeId};

const ORIGIN: &str = "https://example.com";

/// Document with `html > body` and one style sheet
fn document(css: &str) -> (Document, NodeId, SheetId) {
    let mut doc = Document::new(ORIGIN);
    let html = doc.tree.create_element("html");
    let body = doc.tree.create_element("body");
    doc.tree.append_child(NodeId::ROOT, html).unwrap();
    doc.tree.append_child(html, body).unwrap();
    let sheet = doc.add_style_sheet(StyleSheet::parse(css).unwrap());
    (doc, body, sheet)
}

fn element(doc: &mut Document, parent: NodeId, tag: &str, class: &str) -> NodeId {
    let node = doc.tree.create_element(tag);
    if !class.is_empty() {
        doc.tree.set_attribute(node, "class", class).unwrap();
    }
    doc.tree.append_child(parent, node).unwrap();
    node
}

fn selector(doc: &Document, rule: RuleRef) -> String {
    doc.selector_text(rule).unwrap().to_string()
}

fn matches(doc: &Document, rule: RuleRef) -> Vec<NodeId> {
    doc.query_selector_all(NodeId::ROOT, &selector(doc, rule)).unwrap()
}

const CARD_GRID: &str = r#"
    .container { --css-contain: layout inline-size; }
    @media --css-container and (min-width: 400px) {
        .card { color: red; }
    }
"#;

// ============================================================================
// Activation
// ============================================================================

#[test]
fn test_no_document_is_noop() {
    assert!(Polyfill::activate(None).is_none());
}

#[test]
fn test_native_support_is_noop() {
    let (doc, _, sheet) = document(CARD_GRID);
    let mut doc = doc.with_native_containment(true);
    let before = doc.style_sheet(sheet).unwrap().to_css();

    assert!(Polyfill::activate(Some(&mut doc)).is_none());
    assert_eq!(doc.style_sheet(sheet).unwrap().to_css(), before);
}

#[test]
fn test_synthesized_groups_precede_their_rules() {
    let (mut doc, _, sheet) = document(CARD_GRID);
    let polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    let style_sheet = doc.style_sheet(sheet).unwrap();

    // containment group, containment rule, query group, query rule
    assert_eq!(style_sheet.len(), 4);

    let registration = &polyfill.registrations()[0];
    let group = style_sheet.index_of(registration.group().rule).unwrap();
    let origin = style_sheet.index_of(registration.origin().rule).unwrap();
    assert_eq!(group + 1, origin);
    assert_eq!(style_sheet.selector_text(registration.origin().rule), Some(".container"));

    let query = &polyfill.compiled_queries()[0];
    let parent = style_sheet.parent_of(query.substitute.rule).unwrap();
    let RuleParent::Rule(query_group) = parent else {
        panic!("substitute must live in a group");
    };
    assert_eq!(style_sheet.index_of(query_group), Some(2));
    assert!(polyfill.is_synthesized(RuleRef { sheet, rule: query_group }));
    assert!(!polyfill.is_synthesized(registration.origin()));
}

#[test]
fn test_substitute_copies_declarations() {
    let (mut doc, _, sheet) = document(CARD_GRID);
    let polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    let query = &polyfill.compiled_queries()[0];

    assert_eq!(query.contained, ".card");
    assert_eq!(
        doc.style_sheet(sheet).unwrap().css_text(query.substitute.rule).unwrap(),
        ":not(*) { color: red; }"
    );
}

// ============================================================================
// Containment
// ============================================================================

#[test]
fn test_always_false_on_empty_match() {
    let (mut doc, _, _) = document(".missing { --css-contain: layout size; }");
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);

    let registration = &polyfill.registrations()[0];
    assert_eq!(selector(&doc, registration.inline_fallback()), ":not(*)");
    assert_eq!(selector(&doc, registration.block_fallback()), ":not(*)");
    assert!(polyfill.containers().is_empty());
}

#[test]
fn test_axis_independence() {
    let css = r#"
        .wide { --css-contain: layout inline-size; }
        .tall { --css-contain: layout block-size; }
        .both { --css-contain: layout size; }
    "#;
    let (mut doc, _, sheet) = document(css);
    let polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    let style_sheet = doc.style_sheet(sheet).unwrap();
    let group_text = |i: usize| style_sheet.css_text(polyfill.registrations()[i].group().rule).unwrap();

    let wide = group_text(0);
    assert!(wide.contains("inline-size: 0%"));
    assert!(wide.contains("inline-size: 100%"));
    assert!(!wide.contains("block-size"));

    let tall = group_text(1);
    assert!(tall.contains("block-size: 0%"));
    assert!(!tall.contains("inline-size"));

    let both = group_text(2);
    assert_eq!(both.matches(":not(*)").count(), 2);
    assert!(both.contains("inline-size: 100%; block-size: 100%"));
}

#[test]
fn test_partition_by_outer_display() {
    let (mut doc, body, _) = document(".c { --css-contain: layout inline-size; }");
    let block = element(&mut doc, body, "div", "c");
    let inline = element(&mut doc, body, "span", "c");
    let inline_block = element(&mut doc, body, "div", "c");
    doc.tree.set_display(inline_block, Some(Display::InlineBlock)).unwrap();

    let polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    let registration = &polyfill.registrations()[0];
    assert_eq!(matches(&doc, registration.block_fallback()), vec![block]);
    assert_eq!(matches(&doc, registration.inline_fallback()), vec![inline, inline_block]);
    assert_eq!(
        selector(&doc, registration.block_fallback()),
        ":where(:root > :nth-child(1) > :nth-child(1))"
    );
}

#[test]
fn test_scenario_a_new_descendant_after_mutation() {
    let (mut doc, body, _) = document(".grid .item { --css-contain: layout inline-size; }");
    let grid = element(&mut doc, body, "div", "grid");

    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);
    let registration = polyfill.registrations()[0].clone();
    assert_eq!(selector(&doc, registration.inline_fallback()), ":not(*)");
    assert_eq!(selector(&doc, registration.block_fallback()), ":not(*)");

    let item = element(&mut doc, grid, "span", "item");
    polyfill.tick(&mut doc);

    assert_eq!(
        selector(&doc, registration.inline_fallback()),
        ":where(:root > :nth-child(1) > :nth-child(1) > :nth-child(1))"
    );
    assert_eq!(matches(&doc, registration.inline_fallback()), vec![item]);
    assert_eq!(selector(&doc, registration.block_fallback()), ":not(*)");
    assert!(polyfill.containers().contains(item));
    assert!(polyfill.is_observing_size(item));
}

#[test]
fn test_sibling_insertion_refreshes_addresses() {
    let (mut doc, body, _) = document(".c { --css-contain: layout inline-size; }");
    let container = element(&mut doc, body, "div", "c");

    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    let block = polyfill.registrations()[0].block_fallback();
    assert_eq!(matches(&doc, block), vec![container]);

    let before = doc.tree.create_element("p");
    doc.tree.insert_before(body, before, Some(container)).unwrap();
    polyfill.tick(&mut doc);

    assert_eq!(selector(&doc, block), ":where(:root > :nth-child(1) > :nth-child(2))");
    assert_eq!(matches(&doc, block), vec![container]);
}

#[test]
fn test_removed_container_leaves_the_set() {
    let (mut doc, body, _) = document(".c { --css-contain: layout inline-size; }");
    let container = element(&mut doc, body, "div", "c");

    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    assert!(polyfill.containers().contains(container));

    doc.tree.remove_child(body, container).unwrap();
    polyfill.tick(&mut doc);
    assert!(polyfill.containers().is_empty());
    assert!(!polyfill.is_observing_size(container));
    assert_eq!(selector(&doc, polyfill.registrations()[0].block_fallback()), ":not(*)");
}

// ============================================================================
// Container queries
// ============================================================================

/// `.container` with two `.card` children plus a `.card` outside it
fn card_grid(css: &str) -> (Document, NodeId, [NodeId; 3]) {
    let (mut doc, body, _) = document(css);
    let container = element(&mut doc, body, "div", "container");
    let a = element(&mut doc, container, "div", "card");
    let b = element(&mut doc, container, "div", "card");
    let outside = element(&mut doc, body, "div", "card");
    doc.tree.set_content_box(container, BoxSize::new(300.0, 200.0)).unwrap();
    (doc, container, [a, b, outside])
}

#[test]
fn test_scenario_b_resize_crosses_threshold() {
    let (mut doc, container, [a, b, _]) = card_grid(CARD_GRID);
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);

    let substitute = polyfill.compiled_queries()[0].substitute;
    assert_eq!(selector(&doc, substitute), ":not(*)");

    doc.tree.set_content_box(container, BoxSize::new(450.0, 200.0)).unwrap();
    polyfill.tick(&mut doc);

    assert_eq!(
        selector(&doc, substitute),
        ":is(.card):where(:root > :nth-child(1) > :nth-child(1) > :nth-child(1),\
         :root > :nth-child(1) > :nth-child(1) > :nth-child(2))"
    );
    assert_eq!(matches(&doc, substitute), vec![a, b]);

    doc.tree.set_content_box(container, BoxSize::new(399.0, 200.0)).unwrap();
    polyfill.tick(&mut doc);
    assert_eq!(selector(&doc, substitute), ":not(*)");
}

#[test]
fn test_queries_current_right_after_activation() {
    let (mut doc, container, [a, b, _]) = card_grid(CARD_GRID);
    doc.tree.set_content_box(container, BoxSize::new(450.0, 200.0)).unwrap();
    let polyfill = Polyfill::activate(Some(&mut doc)).unwrap();

    let substitute = polyfill.compiled_queries()[0].substitute;
    assert_eq!(matches(&doc, substitute), vec![a, b]);
}

#[test]
fn test_idempotent_cycles() {
    let (mut doc, container, _) = card_grid(CARD_GRID);
    doc.tree.set_content_box(container, BoxSize::new(450.0, 200.0)).unwrap();
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);

    let sheet = polyfill.registrations()[0].origin().sheet;
    let snapshot = doc.style_sheet(sheet).unwrap().to_css();
    let generation = doc.style_sheet(sheet).unwrap().generation();

    polyfill.tick(&mut doc);
    polyfill.tick(&mut doc);
    assert_eq!(doc.style_sheet(sheet).unwrap().to_css(), snapshot);
    assert_eq!(doc.style_sheet(sheet).unwrap().generation(), generation);
}

#[test]
fn test_transform_outputs_are_interchangeable() {
    let escaped = r#"
        .container { --css-contain: layout inline-size; }
        @media \@container (min-width:400px) { .card { color: red; } }
    "#;

    let mut results = Vec::new();
    for css in [CARD_GRID, escaped] {
        let (mut doc, container, _) = card_grid(css);
        doc.tree.set_content_box(container, BoxSize::new(450.0, 200.0)).unwrap();
        let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
        polyfill.tick(&mut doc);
        let substitute = polyfill.compiled_queries()[0].substitute;
        results.push((selector(&doc, substitute), matches(&doc, substitute)));
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].1.len(), 2);
}

#[test]
fn test_height_query_needs_block_containment() {
    let css = r#"
        .container { --css-contain: layout inline-size; }
        @media --css-container and (min-height: 100px) { .card { color: red; } }
    "#;
    let (mut doc, _, _) = card_grid(css);
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);
    assert_eq!(selector(&doc, polyfill.compiled_queries()[0].substitute), ":not(*)");
}

#[test]
fn test_axes_union_across_rules() {
    let css = r#"
        .container { --css-contain: layout inline-size; }
        div.container { --css-contain: layout block-size; }
        @media --css-container and (min-height: 100px) { .card { color: red; } }
    "#;
    let (mut doc, container, [a, b, _]) = card_grid(css);
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);

    assert_eq!(polyfill.containers().axes(container), Some(cqfill::ContainmentAxes::BOTH));
    assert_eq!(matches(&doc, polyfill.compiled_queries()[0].substitute), vec![a, b]);
}

#[test]
fn test_inner_rule_order_preserved() {
    let css = r#"
        .container { --css-contain: layout inline-size; }
        @media --css-container and (max-width: 500px) {
            .card { color: red; }
            .card:first-child { color: blue; }
        }
    "#;
    let (mut doc, _, [a, b, _]) = card_grid(css);
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);

    let queries = polyfill.compiled_queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].contained, ".card");
    assert_eq!(queries[1].contained, ".card:first-child");
    assert_eq!(matches(&doc, queries[0].substitute), vec![a, b]);
    assert_eq!(matches(&doc, queries[1].substitute), vec![a]);
}

#[test]
fn test_font_relative_threshold_frozen_at_activation() {
    let css = r#"
        .container { --css-contain: layout inline-size; }
        @media --css-container and (min-width: 20em) { .card { color: red; } }
    "#;
    let (mut doc, container, _) = card_grid(css);
    doc.tree.set_content_box(container, BoxSize::new(330.0, 100.0)).unwrap();
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    polyfill.tick(&mut doc);
    let substitute = polyfill.compiled_queries()[0].substitute;
    // 20em at the 16px root size
    assert_eq!(matches(&doc, substitute).len(), 2);

    let html = doc.tree.document_element().unwrap();
    doc.tree.set_font_size(html, Some(20.0)).unwrap();
    polyfill.tick(&mut doc);
    assert_eq!(matches(&doc, substitute).len(), 2);
}

#[test]
fn test_font_relative_threshold_every_cycle() {
    let css = r#"
        .container { --css-contain: layout inline-size; }
        @media --css-container and (min-width: 20em) { .card { color: red; } }
    "#;
    let (mut doc, container, _) = card_grid(css);
    doc.tree.set_content_box(container, BoxSize::new(330.0, 100.0)).unwrap();
    let config = Config {
        threshold_resolution: ThresholdResolution::EveryCycle,
        ..Config::default()
    };
    let mut polyfill = Polyfill::activate_with(Some(&mut doc), config).unwrap();
    polyfill.tick(&mut doc);
    let substitute = polyfill.compiled_queries()[0].substitute;
    assert_eq!(matches(&doc, substitute).len(), 2);

    doc.tree.set_font_size(container, Some(20.0)).unwrap();
    polyfill.tick(&mut doc);
    assert!(matches(&doc, substitute).is_empty());
}

// ============================================================================
// Style sheet discovery
// ============================================================================

#[test]
fn test_late_sheet_is_processed_on_tick() {
    let (mut doc, _, _) = card_grid("");
    let mut polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    assert!(polyfill.registrations().is_empty());

    let late = doc.add_style_sheet(StyleSheet::parse(CARD_GRID).unwrap());
    polyfill.tick(&mut doc);
    assert_eq!(polyfill.registrations().len(), 1);
    assert_eq!(polyfill.compiled_queries().len(), 1);
    assert_eq!(doc.style_sheet(late).unwrap().len(), 4);

    assert_eq!(polyfill.poll_style_sheets(&mut doc), 0);
}

#[test]
fn test_cross_origin_sheet_is_skipped() {
    let (mut doc, _, _) = card_grid("");
    let foreign = doc.add_style_sheet(
        StyleSheet::parse(CARD_GRID).unwrap().with_href("https://cdn.example.net/grid.css"),
    );
    let blob = doc.add_style_sheet(
        StyleSheet::parse(CARD_GRID).unwrap().with_href("blob:https://example.com/6a1f"),
    );

    let polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    assert_eq!(doc.style_sheet(foreign).unwrap().len(), 2);
    assert_eq!(doc.style_sheet(blob).unwrap().len(), 4);
    assert_eq!(polyfill.registrations().len(), 1);
}

#[test]
fn test_lookalike_origins_are_skipped() {
    let (mut doc, _, _) = card_grid("");
    let prefixed_host = doc.add_style_sheet(
        StyleSheet::parse(CARD_GRID).unwrap().with_href("https://example.com.evil.net/a.css"),
    );
    let other_port = doc.add_style_sheet(
        StyleSheet::parse(CARD_GRID).unwrap().with_href("https://example.com:8443/a.css"),
    );

    let polyfill = Polyfill::activate(Some(&mut doc)).unwrap();
    assert_eq!(doc.style_sheet(prefixed_host).unwrap().len(), 2);
    assert_eq!(doc.style_sheet(other_port).unwrap().len(), 2);
    assert!(polyfill.registrations().is_empty());
}
