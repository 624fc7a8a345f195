//! cqfill CSS - Live style sheet object model
//!
//! Rule parsing, a mutable rule arena with stable handles, selector
//! matching against `cqfill-dom` trees, media lists and CSS lengths.

mod parser;
pub mod cssom;
pub mod media;
pub mod selectors;
pub mod values;

pub use parser::{CssParser, ParsedRule};
pub use cssom::{
    CssRule, Declaration, DeclarationBlock, GroupingRule, OpaqueRule, RuleId, RuleParent,
    StyleRule, StyleSheet,
};
pub use media::MediaList;
pub use selectors::{SelectorList, query_selector_all};
pub use values::{Length, LengthUnit, ResolutionContext};

/// Parse a CSS style sheet
pub fn parse_stylesheet(css: &str) -> Result<StyleSheet, CssError> {
    StyleSheet::parse(css)
}

/// CSS error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CssError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: u32, message: String },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Index {index} is out of bounds for a rule list of length {len}")]
    IndexSize { index: usize, len: usize },

    #[error("Unknown rule {0:?}")]
    UnknownRule(RuleId),

    #[error("Rule {0:?} cannot contain rules")]
    NotAGroupingRule(RuleId),

    #[error("Rule {0:?} is not a style rule")]
    NotAStyleRule(RuleId),
}
