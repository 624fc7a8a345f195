//! Computed style inputs
//!
//! The host decides how an element is displayed and how large its font is;
//! the polyfill only ever reads those two values back.

/// Initial `font-size` of the root element, in px
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// `display` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    Table,
    InlineTable,
    ListItem,
    Contents,
    None,
}

impl Display {
    /// Parse from a keyword
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Some(Self::Block),
            "inline" => Some(Self::Inline),
            "inline-block" => Some(Self::InlineBlock),
            "flex" => Some(Self::Flex),
            "inline-flex" => Some(Self::InlineFlex),
            "grid" => Some(Self::Grid),
            "inline-grid" => Some(Self::InlineGrid),
            "table" => Some(Self::Table),
            "inline-table" => Some(Self::InlineTable),
            "list-item" => Some(Self::ListItem),
            "contents" => Some(Self::Contents),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Serialize as a keyword
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Inline => "inline",
            Self::InlineBlock => "inline-block",
            Self::Flex => "flex",
            Self::InlineFlex => "inline-flex",
            Self::Grid => "grid",
            Self::InlineGrid => "inline-grid",
            Self::Table => "table",
            Self::InlineTable => "inline-table",
            Self::ListItem => "list-item",
            Self::Contents => "contents",
            Self::None => "none",
        }
    }

    /// Whether the outer display type is inline
    pub fn is_inline_level(self) -> bool {
        self.as_str().contains("inline")
    }

    /// UA default for an element
    pub fn default_for_tag(tag: &str) -> Self {
        match tag {
            "a" | "abbr" | "b" | "bdi" | "bdo" | "br" | "cite" | "code" | "data"
            | "dfn" | "em" | "i" | "kbd" | "label" | "mark" | "q" | "s" | "samp"
            | "small" | "span" | "strong" | "sub" | "sup" | "time" | "u" | "var"
            | "wbr" => Self::Inline,
            "img" | "input" | "button" | "select" | "textarea" | "video" | "canvas" => {
                Self::InlineBlock
            }
            "li" => Self::ListItem,
            "table" => Self::Table,
            "head" | "script" | "style" | "template" | "title" | "meta" | "link" => Self::None,
            _ => Self::Block,
        }
    }
}

/// Host-supplied style values; `None` means "not set on this element"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComputedStyle {
    /// Explicit `display`
    pub display: Option<Display>,
    /// Explicit `font-size` in px (inherits when unset)
    pub font_size: Option<f32>,
}
