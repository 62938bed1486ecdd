//! # blockdown
//!
//! Convert structured rich-text documents to Markdown and back.
//!
//! A document is an ordered list of blocks (paragraphs, headings, quotes,
//! list items, images, code) whose text is split into spans carrying
//! decorator marks and link annotations. Both directions go through HTML
//! markup:
//!
//! ```text
//! Document ─markup─▶ HTML ─▶ Node tree ─convert─▶ Markdown AST ─▶ Markdown
//! Markdown ─comrak─▶ HTML ─▶ Node tree ─blocks──▶ Document
//! ```
//!
//! ## Example
//!
//! ```rust
//! use blockdown::{ConversionService, DecoratorMark, InlineSpan, StructuredNode, TextBlock};
//!
//! let service = ConversionService::new();
//! let doc: Vec<StructuredNode> = vec![TextBlock::paragraph(vec![
//!     InlineSpan::plain("Some "),
//!     InlineSpan::plain("old").with_mark(DecoratorMark::Strikethrough),
//!     InlineSpan::plain(" text."),
//! ])
//! .into()];
//!
//! let markdown = service.serialize(&doc);
//! assert_eq!(markdown, "Some ~~old~~ text.");
//!
//! let parsed = service.parse(&markdown);
//! assert_eq!(parsed.len(), 1);
//! ```
//!
//! ## Example (HTML markup)
//!
//! ```rust
//! use blockdown::{parse_html, ConversionService};
//!
//! let root = parse_html("<h2>Hello</h2>");
//! assert_eq!(root.text_content(), "Hello");
//!
//! let service = ConversionService::new();
//! assert_eq!(service.markup_to_markdown("<h2>Hello</h2>"), "## Hello");
//! ```

mod blocks;
mod convert;
pub mod html;
mod markdown;
pub mod markup;
pub mod node;
pub mod resolve;
mod rules;
pub mod schema;
mod service;
mod utilities;

use once_cell::sync::Lazy;
use serde_json::Value;

pub use blockdown_core::{
    next_key, portable, Annotation, BlockStyle, CodeBlock, CodecError, DecoratorMark, Document,
    HeadingStyle, ImageBlock, Inline, InlineSpan, LinkTarget, ListInfo, ListKind, Options,
    StructuredNode, TextBlock, UnknownBlock,
};
pub use html::parse_html;
pub use markup::{MarkupComponents, MarkupRenderer, Renderer};
pub use node::{Node, NodeRef, NodeType};
pub use resolve::{LinkResolver, PrefixResolver};
pub use rules::{Filter, ReplacementFn, Rule, Rules};
pub use schema::{AnnotationType, BlockContentSchema, ObjectType};
pub use service::ConversionService;
pub use utilities::escape_markdown;

/// Error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Markup error: {0}")]
    Markup(String),

    #[error("Render error: {0}")]
    Render(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Link resolution failed: {0}")]
    Resolve(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

static DEFAULT_SERVICE: Lazy<ConversionService> = Lazy::new(ConversionService::new);

/// Serialize a document with the default service; empty on failure
pub fn serialize(doc: &[StructuredNode]) -> String {
    DEFAULT_SERVICE.serialize(doc)
}

/// Serialize a possibly absent document; `None` gives an empty string
pub fn serialize_opt(doc: Option<&[StructuredNode]>) -> String {
    doc.map(serialize).unwrap_or_default()
}

/// Serialize the stored JSON form of a document with the default service
pub fn serialize_value(value: &Value) -> String {
    DEFAULT_SERVICE.serialize_value(value)
}

pub fn try_serialize(doc: &[StructuredNode]) -> Result<String> {
    DEFAULT_SERVICE.try_serialize(doc)
}

/// Parse Markdown with the default service; empty on failure
pub fn parse(markdown: &str) -> Document {
    DEFAULT_SERVICE.parse(markdown)
}

pub fn try_parse(markdown: &str) -> Result<Document> {
    DEFAULT_SERVICE.try_parse(markdown)
}
