//! Card grid demo
//!
//! Activates the polyfill on a small card grid, resizes the container across
//! a query threshold and prints the rewritten style sheet after each frame.

use cqfill::{Document, Polyfill};
use cqfill_css::StyleSheet;
use cqfill_dom::{BoxSize, NodeId};

const CSS: &str = r#"
.grid { --css-contain: layout inline-size; }

@media --css-container and (min-width: 40em) {
    .card { grid-column: span 2; }
}
"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("cqfill v{}", cqfill::VERSION);

    let mut doc = Document::new("https://example.com");
    let html = doc.tree.create_element("html");
    let body = doc.tree.create_element("body");
    let grid = doc.tree.create_element("section");
    doc.tree.append_child(NodeId::ROOT, html)?;
    doc.tree.append_child(html, body)?;
    doc.tree.append_child(body, grid)?;
    doc.tree.set_attribute(grid, "class", "grid")?;
    for _ in 0..3 {
        let card = doc.tree.create_element("article");
        doc.tree.set_attribute(card, "class", "card")?;
        doc.tree.append_child(grid, card)?;
    }
    doc.add_style_sheet(StyleSheet::parse(CSS)?);

    let Some(mut polyfill) = Polyfill::activate(Some(&mut doc)) else {
        println!("Layout containment is native, nothing to do");
        return Ok(());
    };

    for width in [480.0, 720.0, 560.0] {
        doc.tree.set_content_box(grid, BoxSize::new(width, 300.0))?;
        polyfill.tick(&mut doc);

        println!("\n/* grid at {}px */", width);
        for sheet in doc.style_sheets() {
            println!("{}", sheet.to_css());
        }
    }

    Ok(())
}
