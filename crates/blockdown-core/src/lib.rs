//! blockdown-core - document model, wire form and Markdown writer
//!
//! This crate holds the data structures shared by the conversion engine
//! and the host integration:
//!
//! - [`document`]: the structured rich-text model (blocks, spans, marks, links)
//! - [`portable`]: its Portable-Text-style JSON wire form
//! - the Markdown AST and its writer, [`serialize`]
//!
//! # Architecture
//!
//! ```text
//! JSON field value ──portable──▶ ┌──────────┐
//!                                │ Document │ ──(blockdown)──▶ Markdown AST ──▶ Markdown String
//! ```
//!
//! # Example
//!
//! ```rust
//! use blockdown_core::{Block, Inline, Options, serialize};
//!
//! let ast = Block::Document(vec![
//!     Block::Heading {
//!         level: 2,
//!         content: vec![Inline::Text("Title".to_string())],
//!     },
//!     Block::Paragraph(vec![
//!         Inline::Text("Some ".to_string()),
//!         Inline::Strikethrough(vec![Inline::Text("old".to_string())]),
//!         Inline::Text(" text.".to_string()),
//!     ]),
//! ]);
//!
//! let markdown = serialize(&ast, &Options::default());
//! assert_eq!(markdown, "## Title\n\nSome ~~old~~ text.");
//! ```

mod ast;
pub mod document;
pub mod keys;
mod options;
pub mod portable;
mod serialize;

pub use ast::{inlines_are_blank, Block, Inline, ListItem};
pub use document::{
    Annotation, BlockStyle, CodeBlock, DecoratorMark, Document, ImageBlock, InlineSpan, LinkTarget,
    ListInfo, ListKind, StructuredNode, TextBlock, UnknownBlock,
};
pub use keys::next_key;
pub use options::{HeadingStyle, Options};
pub use serialize::serialize;

/// Error type for wire-form decoding and encoding
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an array of blocks, found {0}")]
    NotAnArray(&'static str),
}

/// Result type for wire-form operations
pub type Result<T> = std::result::Result<T, CodecError>;
