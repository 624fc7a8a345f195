//! CSS Selectors Module
//!
//! Selector parsing and right-to-left matching against a [`DomTree`].
//! Covers the selector syntax the polyfill reads from author rules and the
//! structural selectors it writes back (`:root > :nth-child(n)`,
//! `:is()`, `:where()`, `:not(*)`).

use cqfill_dom::{DomTree, NodeId};

use crate::CssError;

/// Combinator between compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: ancestor descendant
    Descendant,
    /// `>`: parent > child
    Child,
    /// `+`: prev + next
    NextSibling,
    /// `~`: prev ~ subsequent
    SubsequentSibling,
}

/// Pseudo-element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    Before,
    After,
    FirstLine,
    FirstLetter,
    Marker,
    Selection,
    Placeholder,
    Backdrop,
}

impl PseudoElement {
    /// Parse from a name without colons
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "first-line" => Some(Self::FirstLine),
            "first-letter" => Some(Self::FirstLetter),
            "marker" => Some(Self::Marker),
            "selection" => Some(Self::Selection),
            "placeholder" => Some(Self::Placeholder),
            "backdrop" => Some(Self::Backdrop),
            _ => None,
        }
    }

    /// Pseudo-elements that also accept the legacy single-colon syntax
    fn allows_single_colon(self) -> bool {
        matches!(self, Self::Before | Self::After | Self::FirstLine | Self::FirstLetter)
    }
}

/// User-interaction states; this DOM carries none, so they never match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicState {
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
    Visited,
    Target,
}

/// Pseudo-class type
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    // Tree-structural pseudo-classes
    Root,
    Scope,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(NthExpression),
    NthLastChild(NthExpression),
    NthOfType(NthExpression),
    NthLastOfType(NthExpression),

    // Logical pseudo-classes
    Not(SelectorList),
    Is(SelectorList),
    Where(SelectorList),

    // Attribute-backed pseudo-classes
    Link,
    AnyLink,
    Checked,
    Disabled,
    Enabled,

    Dynamic(DynamicState),
}

/// An+B expression for :nth-* selectors
#[derive(Debug, Clone, PartialEq)]
pub struct NthExpression {
    /// Coefficient (A in An+B)
    pub a: i32,
    /// Offset (B in An+B)
    pub b: i32,
}

impl NthExpression {
    /// Create "odd" expression (2n+1)
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// Create "even" expression (2n)
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }

    /// Create a simple index (0n+b)
    pub fn index(n: i32) -> Self {
        Self { a: 0, b: n }
    }

    /// Create An+B expression
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Parse from string like "2n+1", "odd", "even", "3"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();

        match s.as_str() {
            "odd" => return Some(Self::odd()),
            "even" => return Some(Self::even()),
            _ => {}
        }

        if let Ok(n) = s.parse::<i32>() {
            return Some(Self::index(n));
        }

        let s = s.replace(' ', "");
        let n_pos = s.find('n')?;
        let a_str = &s[..n_pos];
        let a = match a_str {
            "" | "+" => 1,
            "-" => -1,
            _ => a_str.parse().ok()?,
        };

        let rest = &s[n_pos + 1..];
        let b = if rest.is_empty() { 0 } else { rest.parse().ok()? };

        Some(Self::new(a, b))
    }

    /// Check if index n (1-based) matches this expression
    pub fn matches(&self, n: i32) -> bool {
        if self.a == 0 {
            return n == self.b;
        }

        let diff = n - self.b;
        if self.a > 0 {
            diff >= 0 && diff % self.a == 0
        } else {
            diff <= 0 && diff % self.a == 0
        }
    }
}

/// A component of a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector *
    Universal,
    /// Type selector (tag name)
    Type(String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
    /// Pseudo-class :root, :nth-child(), etc.
    PseudoClass(PseudoClass),
    /// Pseudo-element ::before, ::after
    PseudoElement(PseudoElement),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (matcher, val) = match (&self.matcher, value) {
            (_, None) => return false,
            (None, Some(_)) => return true,
            (Some(matcher), Some(val)) => (matcher, val),
        };

        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let val = fold(val);

        match matcher {
            AttributeMatcher::Exact(expected) => val == fold(expected),
            AttributeMatcher::Contains(expected) => {
                let expected = fold(expected);
                val.split_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                val == expected || val.starts_with(&format!("{}-", expected))
            }
            AttributeMatcher::Prefix(expected) => {
                !expected.is_empty() && val.starts_with(&fold(expected))
            }
            AttributeMatcher::Suffix(expected) => {
                !expected.is_empty() && val.ends_with(&fold(expected))
            }
            AttributeMatcher::Substring(expected) => {
                !expected.is_empty() && val.contains(&fold(expected))
            }
        }
    }
}

/// A sequence of simple selectors without combinators (e.g. `div.foo#bar`)
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

/// A chain of compound selectors separated by combinators.
///
/// Stored right-to-left: `parts[0]` is the subject, and each entry carries
/// the combinator leading to the entry after it. The last entry's
/// combinator is always `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub parts: Vec<(CompoundSelector, Option<Combinator>)>,
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self, CssError> {
        let mut parser = SelectorParser::new(input);
        let list = parser
            .parse_list(false)
            .ok_or_else(|| CssError::InvalidSelector(input.trim().to_string()))?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(CssError::InvalidSelector(input.trim().to_string()));
        }
        Ok(list)
    }

    /// Whether the element matches any selector in the list
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.matches_in_scope(tree, node, None)
    }

    /// Match with `:scope` bound to `scope`
    pub fn matches_in_scope(&self, tree: &DomTree, node: NodeId, scope: Option<NodeId>) -> bool {
        self.0.iter().any(|s| matches_selector(tree, node, s, scope))
    }

    /// Number of complex selectors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Every element below `scope` (exclusive) matching `selectors`, in tree order
pub fn query_selector_all(tree: &DomTree, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
    tree.descendant_elements(scope)
        .filter(|&node| selectors.matches_in_scope(tree, node, Some(scope)))
        .collect()
}

// ============================================================================
// Matching
// ============================================================================

/// Test whether `node` matches a complex selector
pub fn matches_selector(
    tree: &DomTree,
    node: NodeId,
    selector: &ComplexSelector,
    scope: Option<NodeId>,
) -> bool {
    !selector.parts.is_empty() && matches_from(tree, node, &selector.parts, scope)
}

fn matches_from(
    tree: &DomTree,
    node: NodeId,
    parts: &[(CompoundSelector, Option<Combinator>)],
    scope: Option<NodeId>,
) -> bool {
    let Some(((compound, combinator), rest)) = parts.split_first() else {
        return true;
    };
    if !matches_compound(tree, node, compound, scope) {
        return false;
    }
    let Some(combinator) = combinator else {
        return rest.is_empty();
    };

    // Every candidate is tried so that `a > b c` can skip a `b` with the wrong parent
    match combinator {
        Combinator::Child => tree
            .parent_element(node)
            .is_some_and(|parent| matches_from(tree, parent, rest, scope)),
        Combinator::Descendant => {
            let mut ancestor = tree.parent_element(node);
            while let Some(candidate) = ancestor {
                if matches_from(tree, candidate, rest, scope) {
                    return true;
                }
                ancestor = tree.parent_element(candidate);
            }
            false
        }
        Combinator::NextSibling => tree
            .prev_element_sibling(node)
            .is_some_and(|sibling| matches_from(tree, sibling, rest, scope)),
        Combinator::SubsequentSibling => {
            let mut sibling = tree.prev_element_sibling(node);
            while let Some(candidate) = sibling {
                if matches_from(tree, candidate, rest, scope) {
                    return true;
                }
                sibling = tree.prev_element_sibling(candidate);
            }
            false
        }
    }
}

/// Test whether `node` matches every component of a compound selector
pub fn matches_compound(
    tree: &DomTree,
    node: NodeId,
    compound: &CompoundSelector,
    scope: Option<NodeId>,
) -> bool {
    tree.element(node).is_some()
        && compound
            .components
            .iter()
            .all(|component| matches_component(tree, node, component, scope))
}

fn matches_component(
    tree: &DomTree,
    node: NodeId,
    component: &SelectorComponent,
    scope: Option<NodeId>,
) -> bool {
    let Some(element) = tree.element(node) else {
        return false;
    };
    match component {
        SelectorComponent::Universal => true,
        SelectorComponent::Type(tag) => element.tag.eq_ignore_ascii_case(tag),
        SelectorComponent::Id(id) => element.id.as_deref() == Some(id.as_str()),
        SelectorComponent::Class(class) => element.has_class(class),
        SelectorComponent::Attribute(attr) => attr.matches(element.get_attr(&attr.name)),
        SelectorComponent::PseudoClass(pseudo) => match_pseudo_class(tree, node, pseudo, scope),
        // Element queries never return pseudo-elements
        SelectorComponent::PseudoElement(_) => false,
    }
}

/// Position of an element among its element siblings
struct SiblingPosition {
    index: usize,
    count: usize,
    type_index: usize,
    type_count: usize,
}

fn sibling_position(tree: &DomTree, node: NodeId) -> Option<SiblingPosition> {
    let parent = tree.parent(node)?;
    let tag = &tree.element(node)?.tag;

    let mut position = SiblingPosition { index: 0, count: 0, type_index: 0, type_count: 0 };
    for sibling in tree.element_children(parent) {
        position.count += 1;
        let same_type = tree.element(sibling).is_some_and(|e| &e.tag == tag);
        if same_type {
            position.type_count += 1;
        }
        if sibling == node {
            position.index = position.count;
            position.type_index = position.type_count;
        }
    }
    Some(position)
}

/// Match a pseudo-class against an element
pub fn match_pseudo_class(
    tree: &DomTree,
    node: NodeId,
    pseudo: &PseudoClass,
    scope: Option<NodeId>,
) -> bool {
    let Some(element) = tree.element(node) else {
        return false;
    };
    let is_form_control = matches!(
        element.tag.as_str(),
        "button" | "input" | "select" | "textarea" | "option" | "optgroup" | "fieldset"
    );

    let structural = |f: &dyn Fn(&SiblingPosition) -> bool| {
        sibling_position(tree, node).is_some_and(|p| f(&p))
    };

    match pseudo {
        PseudoClass::Root => tree.document_element() == Some(node),
        PseudoClass::Scope => match scope {
            Some(scope) => scope == node,
            None => tree.document_element() == Some(node),
        },
        PseudoClass::Empty => tree.children(node).all(|child| {
            tree.get(child)
                .is_some_and(|n| !n.is_element() && n.as_text().is_none_or(str::is_empty))
        }),
        PseudoClass::FirstChild => structural(&|p| p.index == 1),
        PseudoClass::LastChild => structural(&|p| p.index == p.count),
        PseudoClass::OnlyChild => structural(&|p| p.count == 1),
        PseudoClass::FirstOfType => structural(&|p| p.type_index == 1),
        PseudoClass::LastOfType => structural(&|p| p.type_index == p.type_count),
        PseudoClass::OnlyOfType => structural(&|p| p.type_count == 1),
        PseudoClass::NthChild(expr) => structural(&|p| expr.matches(p.index as i32)),
        PseudoClass::NthLastChild(expr) => {
            structural(&|p| expr.matches((p.count - p.index + 1) as i32))
        }
        PseudoClass::NthOfType(expr) => structural(&|p| expr.matches(p.type_index as i32)),
        PseudoClass::NthLastOfType(expr) => {
            structural(&|p| expr.matches((p.type_count - p.type_index + 1) as i32))
        }

        PseudoClass::Not(list) => !list.matches_in_scope(tree, node, scope),
        PseudoClass::Is(list) | PseudoClass::Where(list) => {
            list.matches_in_scope(tree, node, scope)
        }

        PseudoClass::Link | PseudoClass::AnyLink => {
            matches!(element.tag.as_str(), "a" | "area") && element.get_attr("href").is_some()
        }
        PseudoClass::Checked => element.get_attr("checked").is_some(),
        PseudoClass::Disabled => is_form_control && element.get_attr("disabled").is_some(),
        PseudoClass::Enabled => is_form_control && element.get_attr("disabled").is_none(),

        PseudoClass::Dynamic(_) => false,
    }
}

// ============================================================================
// Parsing
// ============================================================================

struct SelectorParser {
    chars: Vec<char>,
    pos: usize,
}

impl SelectorParser {
    fn new(input: &str) -> Self {
        Self { chars: input.chars().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// `nested` lists end at `)` instead of end of input
    fn parse_list(&mut self, nested: bool) -> Option<SelectorList> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            let terminated = if nested { self.peek() == Some(')') } else { self.at_end() };
            return terminated.then_some(SelectorList(selectors));
        }
    }

    fn parse_complex(&mut self) -> Option<ComplexSelector> {
        let mut parts_ltr: Vec<(CompoundSelector, Option<Combinator>)> = Vec::new();
        parts_ltr.push((self.parse_compound()?, None));

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(c) if had_whitespace && c != ',' && c != ')' => Combinator::Descendant,
                _ => break,
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            parts_ltr.push((self.parse_compound()?, Some(combinator)));
        }

        // Each combinator moves to the entry on its left; shift them so the
        // right-to-left list carries the combinator on the entry it leaves.
        let mut parts = Vec::with_capacity(parts_ltr.len());
        let mut carried = None;
        for (compound, combinator) in parts_ltr.into_iter().rev() {
            parts.push((compound, carried));
            carried = combinator;
        }
        Some(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Option<CompoundSelector> {
        let mut components = Vec::new();

        if self.eat('*') {
            components.push(SelectorComponent::Universal);
        } else if self.starts_ident() {
            components.push(SelectorComponent::Type(self.parse_ident()?.to_ascii_lowercase()));
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Id(self.parse_name()?));
                }
                Some('.') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Attribute(self.parse_attribute()?));
                }
                Some(':') => {
                    self.pos += 1;
                    components.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        (!components.is_empty()).then_some(CompoundSelector { components })
    }

    fn parse_pseudo(&mut self) -> Option<SelectorComponent> {
        if self.eat(':') {
            let name = self.parse_ident()?;
            return PseudoElement::parse(&name).map(SelectorComponent::PseudoElement);
        }

        let name = self.parse_ident()?.to_ascii_lowercase();
        if self.eat('(') {
            let pseudo = match name.as_str() {
                "not" | "is" | "where" | "matches" | "-webkit-any" => {
                    let list = self.parse_list(true)?;
                    match name.as_str() {
                        "not" => PseudoClass::Not(list),
                        "where" => PseudoClass::Where(list),
                        _ => PseudoClass::Is(list),
                    }
                }
                "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                    let raw = self.read_until_close_paren()?;
                    let expr = NthExpression::parse(&raw)?;
                    match name.as_str() {
                        "nth-child" => PseudoClass::NthChild(expr),
                        "nth-last-child" => PseudoClass::NthLastChild(expr),
                        "nth-of-type" => PseudoClass::NthOfType(expr),
                        _ => PseudoClass::NthLastOfType(expr),
                    }
                }
                _ => return None,
            };
            self.skip_whitespace();
            return self.eat(')').then_some(SelectorComponent::PseudoClass(pseudo));
        }

        let pseudo = match name.as_str() {
            "root" => PseudoClass::Root,
            "scope" => PseudoClass::Scope,
            "empty" => PseudoClass::Empty,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "first-of-type" => PseudoClass::FirstOfType,
            "last-of-type" => PseudoClass::LastOfType,
            "only-of-type" => PseudoClass::OnlyOfType,
            "link" => PseudoClass::Link,
            "any-link" => PseudoClass::AnyLink,
            "checked" => PseudoClass::Checked,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "hover" => PseudoClass::Dynamic(DynamicState::Hover),
            "active" => PseudoClass::Dynamic(DynamicState::Active),
            "focus" => PseudoClass::Dynamic(DynamicState::Focus),
            "focus-visible" => PseudoClass::Dynamic(DynamicState::FocusVisible),
            "focus-within" => PseudoClass::Dynamic(DynamicState::FocusWithin),
            "visited" => PseudoClass::Dynamic(DynamicState::Visited),
            "target" => PseudoClass::Dynamic(DynamicState::Target),
            _ => {
                // Legacy `:before` style pseudo-elements
                let element = PseudoElement::parse(&name).filter(|p| p.allows_single_colon())?;
                return Some(SelectorComponent::PseudoElement(element));
            }
        };
        Some(SelectorComponent::PseudoClass(pseudo))
    }

    fn parse_attribute(&mut self) -> Option<AttributeSelector> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        if self.eat(']') {
            return Some(AttributeSelector { name, matcher: None, case_insensitive: false });
        }

        let op = match self.peek()? {
            '=' => None,
            c @ ('~' | '|' | '^' | '$' | '*') => {
                self.pos += 1;
                Some(c)
            }
            _ => return None,
        };
        if !self.eat('=') {
            return None;
        }
        self.skip_whitespace();

        let value = match self.peek()? {
            quote @ ('"' | '\'') => {
                self.pos += 1;
                self.parse_string(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();

        let mut case_insensitive = false;
        if let Some(flag) = self.peek().filter(|c| matches!(c, 'i' | 'I' | 's' | 'S')) {
            self.pos += 1;
            case_insensitive = flag.eq_ignore_ascii_case(&'i');
            self.skip_whitespace();
        }
        if !self.eat(']') {
            return None;
        }

        let matcher = match op {
            None => AttributeMatcher::Exact(value),
            Some('~') => AttributeMatcher::Contains(value),
            Some('|') => AttributeMatcher::DashMatch(value),
            Some('^') => AttributeMatcher::Prefix(value),
            Some('$') => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Some(AttributeSelector { name, matcher: Some(matcher), case_insensitive })
    }

    fn parse_string(&mut self, quote: char) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.peek()? {
                c if c == quote => {
                    self.pos += 1;
                    return Some(value);
                }
                '\\' => {
                    self.pos += 1;
                    value.push(self.parse_escape()?);
                }
                c => {
                    self.pos += 1;
                    value.push(c);
                }
            }
        }
    }

    fn read_until_close_paren(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek()? != ')' {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn is_name_start(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
    }

    fn is_name_char(c: char) -> bool {
        Self::is_name_start(c) || c.is_ascii_digit() || c == '-'
    }

    fn starts_ident(&self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (Some('-'), Some(c)) => Self::is_name_start(c) || c == '-' || c == '\\',
            (Some('\\'), _) => true,
            (Some(c), _) => Self::is_name_start(c),
            _ => false,
        }
    }

    fn parse_ident(&mut self) -> Option<String> {
        if !self.starts_ident() {
            return None;
        }
        self.parse_name()
    }

    /// Name characters with escapes; `#id` allows a leading digit
    fn parse_name(&mut self) -> Option<String> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                name.push(self.parse_escape()?);
            } else if Self::is_name_char(c) {
                self.pos += 1;
                name.push(c);
            } else {
                break;
            }
        }
        (!name.is_empty()).then_some(name)
    }

    fn parse_escape(&mut self) -> Option<char> {
        let first = self.peek()?;
        if !first.is_ascii_hexdigit() {
            self.pos += 1;
            return Some(first);
        }
        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        let hex: String = self.chars[start..self.pos].iter().collect();
        // A single whitespace terminates a hex escape
        if self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).ok()?;
        Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'))
    }
}
