//! Markdown Abstract Syntax Tree
//!
//! This module defines the AST nodes for representing Markdown documents.
//! It is the last stop before text: the markup converter builds it and
//! [`serialize`](crate::serialize) writes it out.

/// A block-level Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Root document container
    Document(Vec<Block>),

    /// Heading with level (1-6) and inline content
    Heading {
        level: u8,
        content: Vec<Inline>,
    },

    /// Paragraph containing inline content
    Paragraph(Vec<Inline>),

    /// Block quote containing nested blocks
    BlockQuote(Vec<Block>),

    /// List (ordered or unordered)
    List {
        ordered: bool,
        start: u32,
        items: Vec<ListItem>,
    },

    /// Fenced code block
    CodeBlock {
        language: Option<String>,
        code: String,
    },
}

/// A list item containing blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Block>,
}

impl ListItem {
    pub fn new(content: Vec<Block>) -> Self {
        Self { content }
    }

    pub fn from_inlines(inlines: Vec<Inline>) -> Self {
        Self {
            content: vec![Block::Paragraph(inlines)],
        }
    }
}

/// An inline Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Plain text, already escaped for Markdown
    Text(String),

    /// Strong emphasis (bold)
    Strong(Vec<Inline>),

    /// Emphasis (italic)
    Emphasis(Vec<Inline>),

    /// GFM strikethrough (`~~text~~`)
    Strikethrough(Vec<Inline>),

    /// Underline, written as a raw `<u>` tag since Markdown has no syntax for it
    Underline(Vec<Inline>),

    /// Inline code
    Code(String),

    /// Link with text, URL, and optional title. An empty URL is allowed.
    Link {
        content: Vec<Inline>,
        url: String,
        title: Option<String>,
    },

    /// Image with alt text, URL, and optional title
    Image {
        alt: String,
        url: String,
        title: Option<String>,
    },

    /// Hard line break
    LineBreak,
}

impl Block {
    /// Check if this block is empty/blank
    pub fn is_blank(&self) -> bool {
        match self {
            Block::Document(blocks) => blocks.iter().all(|b| b.is_blank()),
            Block::Paragraph(inlines) => inlines.iter().all(|i| i.is_blank()),
            Block::Heading { content, .. } => content.iter().all(|i| i.is_blank()),
            Block::BlockQuote(blocks) => blocks.iter().all(|b| b.is_blank()),
            Block::List { items, .. } => items.iter().all(|i| i.is_blank()),
            Block::CodeBlock { code, .. } => code.trim().is_empty(),
        }
    }
}

impl ListItem {
    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|b| b.is_blank())
    }
}

impl Inline {
    /// Check if this inline is empty/blank
    pub fn is_blank(&self) -> bool {
        match self {
            Inline::Text(text) => text.trim().is_empty(),
            Inline::Strong(inlines)
            | Inline::Emphasis(inlines)
            | Inline::Strikethrough(inlines)
            | Inline::Underline(inlines) => inlines.iter().all(|i| i.is_blank()),
            Inline::Code(code) => code.is_empty(),
            // A link keeps its brackets even around blank text
            Inline::Link { content, url, .. } => {
                url.is_empty() && content.iter().all(|i| i.is_blank())
            }
            Inline::Image { .. } => false,
            Inline::LineBreak => false,
        }
    }
}

/// Check if all inlines in a slice are blank
pub fn inlines_are_blank(inlines: &[Inline]) -> bool {
    inlines.iter().all(|i| i.is_blank())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_paragraph() {
        let block = Block::Paragraph(vec![Inline::Text("  ".to_string())]);
        assert!(block.is_blank());
    }

    #[test]
    fn test_empty_link_is_not_blank() {
        let inline = Inline::Link {
            content: vec![Inline::Text("here".to_string())],
            url: String::new(),
            title: None,
        };
        assert!(!inline.is_blank());
    }

    #[test]
    fn test_nested_marks_blank() {
        let inline = Inline::Strong(vec![Inline::Underline(vec![Inline::Text(" ".to_string())])]);
        assert!(inline.is_blank());
        assert!(!Inline::LineBreak.is_blank());
    }
}
