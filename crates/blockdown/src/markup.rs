//! Document → HTML markup rendering.
//!
//! Each block is rendered through a table of [`MarkupComponents`], one
//! renderer per block style, list kind, list item kind, decorator mark and
//! block type. Consecutive list blocks are grouped into nested `<ul>`/`<ol>`
//! elements by kind and nesting level.

use std::collections::HashMap;

use blockdown_core::{
    Annotation, BlockStyle, CodeBlock, DecoratorMark, ImageBlock, InlineSpan, LinkTarget, ListInfo,
    ListKind, StructuredNode, TextBlock, UnknownBlock,
};

use crate::node::{escape_html, escape_html_attr};
use crate::resolve::LinkResolver;
use crate::Result;

/// Renders already rendered children into an element
pub type Renderer = fn(&str) -> String;

/// Decorator marks from the innermost wrapper to the outermost
const MARK_NESTING: [DecoratorMark; 5] = [
    DecoratorMark::Bold,
    DecoratorMark::Italic,
    DecoratorMark::Code,
    DecoratorMark::Underline,
    DecoratorMark::Strikethrough,
];

/// Renderer table used by [`MarkupRenderer`]
#[derive(Clone)]
pub struct MarkupComponents {
    pub block: HashMap<BlockStyle, Renderer>,
    pub list: HashMap<ListKind, Renderer>,
    pub list_item: HashMap<ListKind, Renderer>,
    pub marks: HashMap<DecoratorMark, Renderer>,
    /// Image block, given the resolved source URL
    pub image: fn(&ImageBlock, &str) -> String,
    pub code: fn(&CodeBlock) -> String,
    /// Block types without a renderer, given their rendered children
    pub unknown: fn(&UnknownBlock, &str) -> String,
}

impl Default for MarkupComponents {
    fn default() -> Self {
        let block: [(BlockStyle, Renderer); 8] = [
            (BlockStyle::Normal, |c| format!("<p>{c}</p>")),
            (BlockStyle::H1, |c| format!("<h1>{c}</h1>")),
            (BlockStyle::H2, |c| format!("<h2>{c}</h2>")),
            (BlockStyle::H3, |c| format!("<h3>{c}</h3>")),
            (BlockStyle::H4, |c| format!("<h4>{c}</h4>")),
            (BlockStyle::H5, |c| format!("<h5>{c}</h5>")),
            (BlockStyle::H6, |c| format!("<h6>{c}</h6>")),
            (BlockStyle::Blockquote, |c| format!("<blockquote>{c}</blockquote>")),
        ];
        let list: [(ListKind, Renderer); 2] = [
            (ListKind::Bullet, |c| format!("<ul>{c}</ul>")),
            (ListKind::Numbered, |c| format!("<ol>{c}</ol>")),
        ];
        let list_item: [(ListKind, Renderer); 2] = [
            (ListKind::Bullet, |c| format!("<li>{c}</li>")),
            (ListKind::Numbered, |c| format!("<li>{c}</li>")),
        ];
        let marks: [(DecoratorMark, Renderer); 5] = [
            (DecoratorMark::Bold, |c| format!("<strong>{c}</strong>")),
            (DecoratorMark::Italic, |c| format!("<em>{c}</em>")),
            (DecoratorMark::Code, |c| format!("<code>{c}</code>")),
            (DecoratorMark::Underline, |c| format!("<u>{c}</u>")),
            (DecoratorMark::Strikethrough, |c| format!("<del>{c}</del>")),
        ];

        Self {
            block: block.into_iter().collect(),
            list: list.into_iter().collect(),
            list_item: list_item.into_iter().collect(),
            marks: marks.into_iter().collect(),
            image: render_image,
            code: render_code,
            unknown: render_unknown,
        }
    }
}

/// Children of an unknown block, kept apart from their neighbours
fn render_unknown(_: &UnknownBlock, children: &str) -> String {
    if children.is_empty() {
        return String::new();
    }
    format!("<p>{children}</p>")
}

fn render_image(image: &ImageBlock, src: &str) -> String {
    let mut html = format!(
        "<img src=\"{}\" alt=\"{}\"",
        escape_html_attr(src),
        escape_html_attr(image.alt_text.as_deref().unwrap_or(""))
    );
    if let Some(caption) = image.caption.as_deref().filter(|c| !c.is_empty()) {
        html.push_str(&format!(" title=\"{}\"", escape_html_attr(caption)));
    }
    html.push('>');
    html
}

fn render_code(code: &CodeBlock) -> String {
    match code.language.as_deref() {
        Some(language) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_html_attr(language),
            escape_html(&code.code)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(&code.code)),
    }
}

/// A list block waiting to be grouped
struct ListEntry {
    info: ListInfo,
    html: String,
}

/// Renders documents to markup through a component table
pub struct MarkupRenderer<'a> {
    components: &'a MarkupComponents,
    resolver: Option<&'a dyn LinkResolver>,
    strict: bool,
}

impl<'a> MarkupRenderer<'a> {
    pub fn new(components: &'a MarkupComponents) -> Self {
        Self {
            components,
            resolver: None,
            strict: false,
        }
    }

    pub fn with_resolver(mut self, resolver: Option<&'a dyn LinkResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Propagate resolver errors instead of treating the link as unresolved
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Render a document as one markup string, blocks in document order
    pub fn render(&self, doc: &[StructuredNode]) -> Result<String> {
        let mut out = String::new();
        let mut run: Vec<ListEntry> = Vec::new();

        for node in doc {
            if let StructuredNode::Text(TextBlock {
                list: Some(info),
                children,
                ..
            }) = node
            {
                run.push(ListEntry {
                    info: *info,
                    html: self.render_spans(children)?,
                });
                continue;
            }

            if !run.is_empty() {
                out.push_str(&self.render_list_run(&run));
                run.clear();
            }

            match node {
                StructuredNode::Text(block) => out.push_str(&self.render_text_block(block)?),
                StructuredNode::Image(image) => {
                    let src = self
                        .resolve_image(&image.asset)?
                        .unwrap_or_else(|| image.asset.clone());
                    out.push_str(&(self.components.image)(image, &src));
                }
                StructuredNode::Code(code) => out.push_str(&(self.components.code)(code)),
                StructuredNode::Unknown(unknown) => {
                    tracing::debug!(
                        block_type = %unknown.type_name,
                        "rendering unknown block by its children"
                    );
                    let children = self.render_spans(&unknown.children)?;
                    out.push_str(&(self.components.unknown)(unknown, &children));
                }
            }
        }

        if !run.is_empty() {
            out.push_str(&self.render_list_run(&run));
        }

        Ok(out)
    }

    fn render_text_block(&self, block: &TextBlock) -> Result<String> {
        let children = self.render_spans(&block.children)?;
        let renderer = self.components.block.get(&block.style).or_else(|| {
            tracing::debug!(style = block.style.wire_name(), "no renderer for style, using normal");
            self.components.block.get(&BlockStyle::Normal)
        });
        Ok(match renderer {
            Some(render) => render(&children),
            None => children,
        })
    }

    fn render_list_run(&self, entries: &[ListEntry]) -> String {
        let mut out = String::new();
        let mut i = 0;
        while let Some(entry) = entries.get(i) {
            let (html, next) = self.render_list(entries, i, entry.info.nesting_level);
            out.push_str(&html);
            i = next;
        }
        out
    }

    /// Render one list starting at `start`, returning its markup and the next unconsumed entry.
    ///
    /// The list ends at an entry shallower than `level`, or at an entry of a
    /// different kind on `level` itself. Deeper entries nest inside the
    /// preceding item.
    fn render_list(&self, entries: &[ListEntry], start: usize, level: u32) -> (String, usize) {
        let kind = entries[start].info.kind;
        let mut items = String::new();
        let mut i = start;

        while let Some(entry) = entries.get(i) {
            let entry_level = entry.info.nesting_level;
            if entry_level < level || (entry_level == level && entry.info.kind != kind) {
                break;
            }

            let mut content = String::new();
            if entry_level == level {
                content.push_str(&entry.html);
                i += 1;
            }
            while let Some(child) = entries.get(i) {
                if child.info.nesting_level <= level {
                    break;
                }
                let (nested, next) = self.render_list(entries, i, child.info.nesting_level);
                content.push_str(&nested);
                i = next;
            }

            items.push_str(&match self.components.list_item.get(&kind) {
                Some(render) => render(&content),
                None => format!("<li>{content}</li>"),
            });
        }

        let html = match self.components.list.get(&kind) {
            Some(render) => render(&items),
            None => items,
        };
        (html, i)
    }

    /// Render spans, merging neighbours that share formatting
    fn render_spans(&self, spans: &[InlineSpan]) -> Result<String> {
        let mut merged: Vec<InlineSpan> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if last.same_formatting(span) => last.text.push_str(&span.text),
                _ => merged.push(span.clone()),
            }
        }

        let mut out = String::new();
        for span in &merged {
            out.push_str(&self.render_span(span)?);
        }
        Ok(out)
    }

    fn render_span(&self, span: &InlineSpan) -> Result<String> {
        let text = span.text.as_str();
        let core_start = text.len() - text.trim_start().len();
        let core_end = text.trim_end().len();

        if (span.marks.is_empty() && span.annotation.is_none()) || core_start >= core_end {
            return Ok(text_html(text));
        }

        let mut html = text_html(&text[core_start..core_end]);
        for mark in MARK_NESTING.iter().filter(|m| span.has(**m)) {
            match self.components.marks.get(mark) {
                Some(render) => html = render(&html),
                None => tracing::debug!(mark = mark.wire_name(), "no renderer for mark"),
            }
        }
        if let Some(annotation) = &span.annotation {
            html = self.render_link(annotation, &html)?;
        }

        Ok(format!(
            "{}{}{}",
            text_html(&text[..core_start]),
            html,
            text_html(&text[core_end..])
        ))
    }

    fn render_link(&self, annotation: &Annotation, children: &str) -> Result<String> {
        let href = match &annotation.link {
            LinkTarget::External { url } => url.clone(),
            LinkTarget::Internal { target_document_id } => self
                .resolve_document(target_document_id)?
                .unwrap_or_default(),
        };
        let target = if annotation.open_in_new_tab {
            " target=\"_blank\" rel=\"noopener noreferrer\""
        } else {
            ""
        };
        Ok(format!(
            "<a href=\"{}\"{}>{}</a>",
            escape_html_attr(&href),
            target,
            children
        ))
    }

    fn resolve_document(&self, target_document_id: &str) -> Result<Option<String>> {
        let Some(resolver) = self.resolver else {
            return Ok(None);
        };
        match resolver.resolve_document(target_document_id) {
            Ok(url) => Ok(url),
            Err(err) if !self.strict => {
                tracing::warn!(
                    target_document_id,
                    error = %err,
                    "leaving internal link unresolved"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_image(&self, asset: &str) -> Result<Option<String>> {
        let Some(resolver) = self.resolver else {
            return Ok(None);
        };
        match resolver.resolve_image(asset) {
            Ok(url) => Ok(url),
            Err(err) if !self.strict => {
                tracing::warn!(asset, error = %err, "using asset reference as image source");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Escape span text, turning newlines into line breaks
fn text_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConversionError;
    use blockdown_core::ListKind;
    use pretty_assertions::assert_eq;

    fn render(doc: &[StructuredNode]) -> String {
        let components = MarkupComponents::default();
        MarkupRenderer::new(&components).render(doc).unwrap()
    }

    fn item(kind: ListKind, level: u32, text: &str) -> StructuredNode {
        TextBlock::list_item(kind, level, vec![InlineSpan::plain(text)]).into()
    }

    #[test]
    fn test_styles() {
        let doc: Vec<StructuredNode> = vec![
            TextBlock::new(BlockStyle::H2, vec![InlineSpan::plain("Title")]).into(),
            TextBlock::new(BlockStyle::Blockquote, vec![InlineSpan::plain("q")]).into(),
            TextBlock::paragraph(vec![InlineSpan::plain("a < b & c")]).into(),
        ];
        assert_eq!(
            render(&doc),
            "<h2>Title</h2><blockquote>q</blockquote><p>a &lt; b &amp; c</p>"
        );
    }

    #[test]
    fn test_mark_nesting_order() {
        let span = InlineSpan::plain("x")
            .with_marks(DecoratorMark::ALL)
            .with_annotation(Annotation::external("https://x.com"));
        let doc: Vec<StructuredNode> = vec![TextBlock::paragraph(vec![span]).into()];
        assert_eq!(
            render(&doc),
            "<p><a href=\"https://x.com\">\
             <del><u><code><em><strong>x</strong></em></code></u></del>\
             </a></p>"
        );
    }

    #[test]
    fn test_whitespace_moves_outside_marks() {
        let doc: Vec<StructuredNode> = vec![TextBlock::paragraph(vec![
            InlineSpan::plain("a"),
            InlineSpan::plain(" bold ").with_mark(DecoratorMark::Bold),
            InlineSpan::plain("b"),
        ])
        .into()];
        assert_eq!(render(&doc), "<p>a <strong>bold</strong> b</p>");
    }

    #[test]
    fn test_adjacent_spans_merge() {
        let doc: Vec<StructuredNode> = vec![TextBlock::paragraph(vec![
            InlineSpan::plain("one ").with_mark(DecoratorMark::Italic),
            InlineSpan::plain("two").with_mark(DecoratorMark::Italic),
        ])
        .into()];
        assert_eq!(render(&doc), "<p><em>one two</em></p>");
    }

    #[test]
    fn test_newline_becomes_break() {
        let doc: Vec<StructuredNode> =
            vec![TextBlock::paragraph(vec![InlineSpan::plain("a\nb")]).into()];
        assert_eq!(render(&doc), "<p>a<br>b</p>");
    }

    #[test]
    fn test_internal_link_without_resolver() {
        let doc: Vec<StructuredNode> = vec![TextBlock::paragraph(vec![
            InlineSpan::plain("post").with_annotation(Annotation::internal("doc123").in_new_tab())
        ])
        .into()];
        assert_eq!(
            render(&doc),
            "<p><a href=\"\" target=\"_blank\" rel=\"noopener noreferrer\">post</a></p>"
        );
    }

    struct FailingResolver;

    impl LinkResolver for FailingResolver {
        fn resolve_document(&self, _: &str) -> Result<Option<String>> {
            Err(ConversionError::Resolve("offline".to_string()))
        }
    }

    #[test]
    fn test_resolver_errors() {
        let components = MarkupComponents::default();
        let resolver = FailingResolver;
        let doc: Vec<StructuredNode> = vec![TextBlock::paragraph(vec![
            InlineSpan::plain("post").with_annotation(Annotation::internal("doc123"))
        ])
        .into()];

        let lenient = MarkupRenderer::new(&components).with_resolver(Some(&resolver));
        assert_eq!(lenient.render(&doc).unwrap(), "<p><a href=\"\">post</a></p>");

        let strict = MarkupRenderer::new(&components)
            .with_resolver(Some(&resolver))
            .strict(true);
        assert!(matches!(strict.render(&doc), Err(ConversionError::Resolve(_))));
    }

    #[test]
    fn test_flat_list() {
        let doc: Vec<StructuredNode> = vec![
            item(ListKind::Bullet, 0, "a"),
            item(ListKind::Bullet, 0, "b"),
        ];
        assert_eq!(render(&doc), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_nested_lists() {
        let doc: Vec<StructuredNode> = vec![
            item(ListKind::Bullet, 0, "a"),
            item(ListKind::Numbered, 1, "a1"),
            item(ListKind::Numbered, 1, "a2"),
            item(ListKind::Bullet, 0, "b"),
        ];
        assert_eq!(
            render(&doc),
            "<ul><li>a<ol><li>a1</li><li>a2</li></ol></li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_list_kind_change_ends_group() {
        let doc: Vec<StructuredNode> = vec![
            item(ListKind::Bullet, 0, "a"),
            item(ListKind::Numbered, 0, "b"),
            TextBlock::paragraph(vec![InlineSpan::plain("p")]).into(),
            item(ListKind::Numbered, 0, "c"),
        ];
        assert_eq!(
            render(&doc),
            "<ul><li>a</li></ul><ol><li>b</li></ol><p>p</p><ol><li>c</li></ol>"
        );
    }

    #[test]
    fn test_list_starting_deep() {
        let doc = vec![item(ListKind::Bullet, 1, "deep"), item(ListKind::Bullet, 0, "top")];
        assert_eq!(
            render(&doc),
            "<ul><li>deep</li></ul><ul><li>top</li></ul>"
        );
    }

    #[test]
    fn test_image_and_code() {
        let doc: Vec<StructuredNode> = vec![
            ImageBlock::new("https://cdn.x.com/cat.png")
                .with_alt("A cat")
                .with_caption("Meow")
                .into(),
            ImageBlock::new("image-abc").into(),
            CodeBlock::new(Some("rust"), "if a < b {}").into(),
        ];
        assert_eq!(
            render(&doc),
            "<img src=\"https://cdn.x.com/cat.png\" alt=\"A cat\" title=\"Meow\">\
             <img src=\"image-abc\" alt=\"\">\
             <pre><code class=\"language-rust\">if a &lt; b {}</code></pre>"
        );
    }

    fn unknown(type_name: &str, children: Vec<InlineSpan>) -> StructuredNode {
        StructuredNode::Unknown(UnknownBlock {
            key: None,
            type_name: type_name.to_string(),
            children,
        })
    }

    #[test]
    fn test_unknown_block_renders_its_children() {
        let doc = vec![unknown(
            "callout",
            vec![InlineSpan::plain("note").with_mark(DecoratorMark::Bold)],
        )];
        assert_eq!(render(&doc), "<p><strong>note</strong></p>");
    }

    #[test]
    fn test_consecutive_unknown_blocks_stay_apart() {
        let doc = vec![
            unknown("callout", vec![InlineSpan::plain("first")]),
            unknown("callout", vec![]),
            unknown("embed", vec![InlineSpan::plain("second")]),
        ];
        assert_eq!(render(&doc), "<p>first</p><p>second</p>");
    }
}
