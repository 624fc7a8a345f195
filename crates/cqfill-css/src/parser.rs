//! CSS Parser
//!
//! Rule structure is read with cssparser and declaration blocks with
//! lightningcss. Preludes are kept as written, token by token, because
//! transformed container conditions such as `\@container (min-width:700px)`
//! are not media queries lightningcss accepts. Grouping at-rules (`@media`,
//! `@supports`) are parsed recursively, every other at-rule is kept verbatim.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, ParseErrorKind, Parser, ParserInput,
    ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser, Token,
};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::stylesheet::ParserOptions;
use lightningcss::traits::ToCss;

use crate::CssError;
use crate::cssom::Declaration;

/// A parsed rule before it is placed into a sheet
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRule {
    Style { selector: String, declarations: Vec<Declaration> },
    Media { condition: String, rules: Vec<ParsedRule> },
    Supports { condition: String, rules: Vec<ParsedRule> },
    Opaque { name: String, text: String },
}

/// CSS Parser
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a whole style sheet
    ///
    /// Blocks left open at the end of input are closed implicitly.
    pub fn parse(&self, css: &str) -> Result<Vec<ParsedRule>, CssError> {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rules = RuleListParser;
        collect_rules(StyleSheetParser::new(&mut parser, &mut rules)).map_err(|e| to_css_error(&e))
    }

    /// Parse text that must contain exactly one rule
    pub fn parse_rule(&self, css: &str) -> Result<ParsedRule, CssError> {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        cssparser::parse_one_rule(&mut parser, &mut RuleListParser).map_err(|e| to_css_error(&e))
    }

    /// Parse a declaration block body (text between the braces)
    ///
    /// Invalid declarations are dropped. Normal declarations come first,
    /// then `!important` ones.
    pub fn parse_declarations(&self, body: &str) -> Vec<Declaration> {
        let options = ParserOptions { error_recovery: true, ..ParserOptions::default() };
        let block = match DeclarationBlock::parse_string(body, options) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!("Dropping declaration block: {}", e.kind);
                return Vec::new();
            }
        };

        let normal = block.declarations.iter().map(|property| (property, false));
        let important = block.important_declarations.iter().map(|property| (property, true));
        normal
            .chain(important)
            .filter_map(|(property, important)| convert_declaration(property, important))
            .collect()
    }
}

fn convert_declaration(property: &Property<'_>, important: bool) -> Option<Declaration> {
    let name = property.property_id().to_css_string(PrinterOptions::default()).ok()?;
    let value = property.value_to_css_string(PrinterOptions::default()).ok()?;
    // Custom property names are case-sensitive
    let name = if name.starts_with("--") { name } else { name.to_ascii_lowercase() };
    Some(Declaration { name, value, important })
}

/// Check rule text with lightningcss; invalid rules are dropped during
/// recovery, so a count mismatch means lightningcss rejected something.
pub fn validate_rule_text(css: &str, expected_rules: usize) -> Result<(), CssError> {
    use lightningcss::stylesheet::StyleSheet;

    let options = ParserOptions { error_recovery: true, ..ParserOptions::default() };
    let stylesheet = StyleSheet::parse(css, options).map_err(|e| CssError::ParseError {
        line: e.loc.as_ref().map(|loc| loc.line + 1).unwrap_or(0),
        message: format!("{:?}", e.kind),
    })?;

    let found = stylesheet.rules.0.len();
    if found != expected_rules {
        return Err(CssError::ParseError {
            line: 0,
            message: format!("rejected rule text {:?}", css),
        });
    }
    Ok(())
}

/// Check selector text with lightningcss
pub fn validate_selector_text(selector: &str) -> Result<(), CssError> {
    use lightningcss::rules::CssRule;
    use lightningcss::stylesheet::StyleSheet;

    let css = format!("{} {{}}", selector);
    let options = ParserOptions { error_recovery: true, ..ParserOptions::default() };
    let stylesheet = StyleSheet::parse(&css, options)
        .map_err(|_| CssError::InvalidSelector(selector.to_string()))?;

    match stylesheet.rules.0.as_slice() {
        [CssRule::Style(_)] => Ok(()),
        _ => Err(CssError::InvalidSelector(selector.to_string())),
    }
}

/// Normalize prelude text: comments are dropped and whitespace runs become
/// one space, while strings and escapes keep their source text
pub fn normalize_prelude(text: &str) -> String {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    normalized_tokens(&mut parser)
}

fn normalized_tokens(input: &mut Parser<'_, '_>) -> String {
    let mut out = String::new();
    append_tokens(input, &mut out);
    out.trim_end().to_string()
}

fn append_tokens(input: &mut Parser<'_, '_>, out: &mut String) {
    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return,
        };
        match token {
            Token::WhiteSpace(_) => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            Token::Comment(_) => {}
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                out.push_str(input.slice_from(start));
                let close = match token {
                    Token::SquareBracketBlock => ']',
                    Token::CurlyBracketBlock => '}',
                    _ => ')',
                };
                let _: Result<(), ParseError<'_, ()>> = input.parse_nested_block(|nested| {
                    append_tokens(nested, out);
                    Ok(())
                });
                out.push(close);
            }
            _ => out.push_str(input.slice_from(start)),
        }
    }
}

/// Convert a cssparser error, reporting 1-based lines
fn to_css_error(error: &ParseError<'_, CssError>) -> CssError {
    match &error.kind {
        ParseErrorKind::Custom(e) => e.clone(),
        ParseErrorKind::Basic(kind) => {
            CssError::ParseError { line: error.location.line + 1, message: kind.to_string() }
        }
    }
}

fn collect_rules<'i>(
    items: impl Iterator<Item = Result<ParsedRule, (ParseError<'i, CssError>, &'i str)>>,
) -> Result<Vec<ParsedRule>, ParseError<'i, CssError>> {
    let mut rules = Vec::new();
    for item in items {
        match item {
            Ok(rule) => rules.push(rule),
            Err((error, text)) => {
                tracing::debug!("Rejected rule {:?}", text.trim());
                return Err(error);
            }
        }
    }
    Ok(rules)
}

enum AtRulePrelude {
    Media(String),
    Supports(String),
    Other { name: String, head: String },
}

/// Rule list parser shared by the sheet and grouping rule bodies
struct RuleListParser;

impl<'i> AtRuleParser<'i> for RuleListParser {
    type Prelude = AtRulePrelude;
    type AtRule = ParsedRule;
    type Error = CssError;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<AtRulePrelude, ParseError<'i, CssError>> {
        let prelude = normalized_tokens(input);
        let lower = name.to_ascii_lowercase();
        Ok(match lower.as_str() {
            "media" => AtRulePrelude::Media(prelude),
            "supports" => AtRulePrelude::Supports(prelude),
            _ => {
                let head = if prelude.is_empty() {
                    format!("@{}", &*name)
                } else {
                    format!("@{} {}", &*name, prelude)
                };
                AtRulePrelude::Other { name: lower, head }
            }
        })
    }

    fn rule_without_block(
        &mut self,
        prelude: AtRulePrelude,
        _start: &ParserState,
    ) -> Result<ParsedRule, ()> {
        match prelude {
            AtRulePrelude::Other { name, head } => {
                Ok(ParsedRule::Opaque { name, text: format!("{};", head) })
            }
            // Grouping rules need a block
            AtRulePrelude::Media(_) | AtRulePrelude::Supports(_) => Err(()),
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: AtRulePrelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<ParsedRule, ParseError<'i, CssError>> {
        match prelude {
            AtRulePrelude::Media(condition) => {
                let rules = collect_rules(RuleBodyParser::new(input, self))?;
                Ok(ParsedRule::Media { condition, rules })
            }
            AtRulePrelude::Supports(condition) => {
                let rules = collect_rules(RuleBodyParser::new(input, self))?;
                Ok(ParsedRule::Supports { condition, rules })
            }
            AtRulePrelude::Other { name, head } => {
                let body = consume_block(input).trim();
                let text = if body.is_empty() {
                    format!("{} {{}}", head)
                } else {
                    format!("{} {{ {} }}", head, body)
                };
                Ok(ParsedRule::Opaque { name, text })
            }
        }
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
    type Prelude = String;
    type QualifiedRule = ParsedRule;
    type Error = CssError;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<String, ParseError<'i, CssError>> {
        let selector = normalized_tokens(input);
        validate_selector_text(&selector).map_err(|e| input.new_custom_error(e))?;
        Ok(selector)
    }

    fn parse_block<'t>(
        &mut self,
        selector: String,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<ParsedRule, ParseError<'i, CssError>> {
        let declarations = CssParser::new().parse_declarations(consume_block(input));
        Ok(ParsedRule::Style { selector, declarations })
    }
}

// Grouping rule bodies hold rules only
impl<'i> DeclarationParser<'i> for RuleListParser {
    type Declaration = ParsedRule;
    type Error = CssError;
}

impl<'i> RuleBodyItemParser<'i, ParsedRule, CssError> for RuleListParser {
    fn parse_declarations(&self) -> bool {
        false
    }

    fn parse_qualified(&self) -> bool {
        true
    }
}

/// Consume the rest of a block, returning its source text
fn consume_block<'i>(input: &mut Parser<'i, '_>) -> &'i str {
    let start = input.position();
    while input.next_including_whitespace_and_comments().is_ok() {}
    input.slice_from(start)
}
