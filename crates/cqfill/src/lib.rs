//! cqfill
//!
//! Layout containment and container query polyfill runtime.
//!
//! Style sheets written with the `--css-contain` custom property and
//! container-marked `@media` rules are rewritten in place: the engine
//! inserts always-false substitute rules next to the author rules and keeps
//! their selectors pointed at the right elements as the document's
//! structure, geometry and style sheets change.
//!
//! # Example
//! ```rust,ignore
//! use cqfill::{Document, Polyfill};
//! use cqfill_css::StyleSheet;
//!
//! let mut doc = Document::new("https://example.com");
//! doc.add_style_sheet(StyleSheet::parse(css)?);
//! let mut polyfill = Polyfill::activate(Some(&mut doc)).expect("containment unsupported");
//! // once per frame
//! polyfill.tick(&mut doc);
//! ```

mod config;
mod document;
mod polyfill;
pub mod address;
pub mod classify;
pub mod containment;
pub mod evaluate;
pub mod query;

pub use config::{Config, ThresholdResolution};
pub use document::{Document, RuleRef, SheetId, Viewport};
pub use polyfill::Polyfill;
pub use classify::{ContainmentAxes, RuleClass};
pub use containment::{ContainerRegistration, ContainerSet, RegistrationId};
pub use query::{CompiledQuery, QueryAxis, QueryBound, SizePredicate};

use cqfill_css::CssError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("CSS error: {0}")]
    Css(#[from] CssError),

    #[error("Unknown style sheet {0:?}")]
    UnknownSheet(SheetId),

    #[error("Rule {0:?} is no longer in its style sheet")]
    DetachedRule(RuleRef),

    #[error("Fallback group for {0:?} does not hold two rules")]
    MalformedFallback(RuleRef),
}

/// Assign a selector only when it differs; returns whether it wrote
pub(crate) fn write_selector(doc: &mut Document, rule: RuleRef, text: &str) -> Result<bool, EngineError> {
    let sheet = doc
        .style_sheet_mut(rule.sheet)
        .ok_or(EngineError::UnknownSheet(rule.sheet))?;
    match sheet.selector_text(rule.rule) {
        Some(current) if current == text => Ok(false),
        Some(_) => {
            sheet.set_selector_text(rule.rule, text)?;
            Ok(true)
        }
        None => Err(EngineError::DetachedRule(rule)),
    }
}
