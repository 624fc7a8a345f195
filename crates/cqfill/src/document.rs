//! Host document
//!
//! Ties a DOM tree to its style sheets, viewport and origin: the platform
//! surface the polyfill reads from and writes to.

use cqfill_css::{CssError, RuleId, SelectorList, StyleSheet, query_selector_all};
use cqfill_dom::{DomTree, NodeId};
use url::Url;

/// Index into [`Document::style_sheets`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub(crate) usize);

impl SheetId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A rule in one of the document's sheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleRef {
    pub sheet: SheetId,
    pub rule: RuleId,
}

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280.0, height: 720.0 }
    }
}

/// Document with its style sheet collection
#[derive(Debug, Clone)]
pub struct Document {
    /// Element tree
    pub tree: DomTree,
    /// Viewport used for `vw`/`vh` units
    pub viewport: Viewport,
    style_sheets: Vec<StyleSheet>,
    origin: String,
    native_containment: bool,
}

impl Document {
    /// Empty document served from `origin` (e.g. `https://example.com`)
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            tree: DomTree::new(),
            viewport: Viewport::default(),
            style_sheets: Vec::new(),
            origin: origin.into(),
            native_containment: false,
        }
    }

    /// Declare whether the host supports `contain: layout inline-size` itself
    pub fn with_native_containment(mut self, supported: bool) -> Self {
        self.native_containment = supported;
        self
    }

    pub fn supports_native_containment(&self) -> bool {
        self.native_containment
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Attach a style sheet, as a `<style>` or `<link>` would
    pub fn add_style_sheet(&mut self, sheet: StyleSheet) -> SheetId {
        self.style_sheets.push(sheet);
        SheetId(self.style_sheets.len() - 1)
    }

    pub fn style_sheets(&self) -> &[StyleSheet] {
        &self.style_sheets
    }

    pub fn style_sheet(&self, id: SheetId) -> Option<&StyleSheet> {
        self.style_sheets.get(id.0)
    }

    pub fn style_sheet_mut(&mut self, id: SheetId) -> Option<&mut StyleSheet> {
        self.style_sheets.get_mut(id.0)
    }

    /// Whether the sheet's rules are readable from this origin
    ///
    /// Relative hrefs resolve against the document origin. `blob:` URLs
    /// carry the origin of the URL they wrap.
    pub fn is_same_origin(&self, id: SheetId) -> bool {
        let Some(sheet) = self.style_sheet(id) else {
            return false;
        };
        let Some(href) = sheet.href() else {
            return true;
        };
        let Ok(base) = Url::parse(&self.origin) else {
            tracing::debug!("Document origin {:?} is not a URL", self.origin);
            return false;
        };
        base.join(href).is_ok_and(|url| url.origin() == base.origin())
    }

    /// Selector text of a style rule
    pub fn selector_text(&self, rule: RuleRef) -> Option<&str> {
        self.style_sheet(rule.sheet)?.selector_text(rule.rule)
    }

    /// `scope.querySelectorAll(selectors)`
    pub fn query_selector_all(&self, scope: NodeId, selectors: &str) -> Result<Vec<NodeId>, CssError> {
        let list = SelectorList::parse(selectors)?;
        Ok(query_selector_all(&self.tree, scope, &list))
    }

    /// Root element font size, or `fallback` without a root element
    pub fn root_font_size(&self, fallback: f32) -> f32 {
        self.tree
            .document_element()
            .map(|root| self.tree.computed_font_size(root))
            .unwrap_or(fallback)
    }
}
