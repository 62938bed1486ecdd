//! ConversionService - the main entry point for both conversion directions.

use std::sync::Arc;

use blockdown_core::{portable, Document, Options, StructuredNode};
use serde_json::Value;

use crate::blocks::build_document;
use crate::convert::convert;
use crate::html::parse_html;
use crate::markdown::markdown_to_html;
use crate::markup::{MarkupComponents, MarkupRenderer};
use crate::resolve::LinkResolver;
use crate::rules::{Rule, Rules};
use crate::schema::BlockContentSchema;
use crate::{ConversionError, Result};

/// Converts structured documents to Markdown and Markdown back to documents.
///
/// The fail-soft methods ([`serialize`](Self::serialize),
/// [`parse`](Self::parse)) log errors and return empty output; the `try_`
/// variants return them.
pub struct ConversionService {
    options: Options,
    rules: Rules,
    components: MarkupComponents,
    schema: BlockContentSchema,
    resolver: Option<Arc<dyn LinkResolver>>,
}

impl ConversionService {
    /// Create a ConversionService with default options
    pub fn new() -> Self {
        Self {
            options: Options::default(),
            rules: Rules::new(),
            components: MarkupComponents::default(),
            schema: BlockContentSchema::default(),
            resolver: None,
        }
    }

    /// Use custom Markdown writer options
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Restrict what parsing may produce
    pub fn with_schema(mut self, schema: BlockContentSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Resolve internal links and image assets when serializing
    pub fn with_resolver(mut self, resolver: Arc<dyn LinkResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the markup renderer table
    pub fn with_components(mut self, components: MarkupComponents) -> Self {
        self.components = components;
        self
    }

    /// Add a custom rewrite rule, checked before the built-in ones
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn schema(&self) -> &BlockContentSchema {
        &self.schema
    }

    fn renderer(&self) -> MarkupRenderer<'_> {
        MarkupRenderer::new(&self.components).with_resolver(self.resolver.as_deref())
    }

    /// Render a document to markup
    pub fn to_markup(&self, doc: &[StructuredNode]) -> Result<String> {
        self.renderer().render(doc)
    }

    /// Convert markup to Markdown
    pub fn markup_to_markdown(&self, html: &str) -> String {
        let ast = convert(&parse_html(html), &self.rules, &self.options);
        blockdown_core::serialize(&ast, &self.options)
    }

    /// Serialize a document to Markdown, returning resolver errors
    pub fn try_serialize(&self, doc: &[StructuredNode]) -> Result<String> {
        if doc.is_empty() {
            return Ok(String::new());
        }
        let html = self.renderer().strict(true).render(doc)?;
        Ok(self.markup_to_markdown(&html))
    }

    /// Serialize a document to Markdown; empty on failure
    pub fn serialize(&self, doc: &[StructuredNode]) -> String {
        if doc.is_empty() {
            return String::new();
        }
        match self.renderer().render(doc) {
            Ok(html) => self.markup_to_markdown(&html),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize document");
                String::new()
            }
        }
    }

    /// Serialize the stored JSON form of a document
    pub fn try_serialize_value(&self, value: &Value) -> Result<String> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Array(_) => self.try_serialize(&portable::decode_document(value)),
            other => Err(ConversionError::Codec(blockdown_core::CodecError::NotAnArray(
                portable::value_kind(other),
            ))),
        }
    }

    /// Serialize the stored JSON form of a document; empty for anything but an array
    pub fn serialize_value(&self, value: &Value) -> String {
        match value {
            Value::Array(_) => self.serialize(&portable::decode_document(value)),
            Value::Null => String::new(),
            other => {
                tracing::warn!(kind = portable::value_kind(other), "expected an array of blocks");
                String::new()
            }
        }
    }

    /// Parse Markdown into a document
    pub fn try_parse(&self, markdown: &str) -> Result<Document> {
        if markdown.trim().is_empty() {
            return Ok(Vec::new());
        }
        let html = markdown_to_html(markdown)?;
        Ok(build_document(&parse_html(&html), &self.schema))
    }

    /// Parse Markdown into a document; empty on failure
    pub fn parse(&self, markdown: &str) -> Document {
        self.try_parse(markdown).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to parse markdown");
            Vec::new()
        })
    }

    /// Parse Markdown into the stored JSON form
    pub fn try_parse_value(&self, markdown: &str) -> Result<Value> {
        let doc = self.try_parse(markdown)?;
        Ok(portable::to_value(&doc)?)
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}
