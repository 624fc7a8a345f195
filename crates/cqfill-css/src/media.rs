//! Media lists
//!
//! Splits a media condition into its comma-separated media queries.

/// Comma-separated media query list, as exposed by `CSSMediaRule.media`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaList {
    media: Vec<String>,
}

impl MediaList {
    /// Split on commas outside parentheses, brackets and strings
    pub fn parse(text: &str) -> Self {
        let mut media = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for c in text.chars() {
            if escaped {
                escaped = false;
                current.push(c);
                continue;
            }
            match (quote, c) {
                (_, '\\') => escaped = true,
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '(' | '[') => depth += 1,
                (None, ')' | ']') => depth = depth.saturating_sub(1),
                (None, ',') if depth == 0 => {
                    push_medium(&mut media, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(c);
        }
        push_medium(&mut media, &current);

        Self { media }
    }

    /// Medium at index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.media.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.media.iter().map(String::as_str)
    }

    /// Serialized list
    pub fn media_text(&self) -> String {
        self.media.join(", ")
    }
}

fn push_medium(media: &mut Vec<String>, raw: &str) {
    let medium = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !medium.is_empty() {
        media.push(medium);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_media_list() {
        let list = MediaList::parse("screen and (min-width: 100px),  print");
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0), Some("screen and (min-width: 100px)"));
        assert_eq!(list.get(1), Some("print"));
        assert_eq!(list.media_text(), "screen and (min-width: 100px), print");
    }

    #[test]
    fn test_commas_inside_parens() {
        let list = MediaList::parse("--css-container and (min-width: calc(1px, 2px))");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty() {
        assert!(MediaList::parse("  ").is_empty());
    }
}
