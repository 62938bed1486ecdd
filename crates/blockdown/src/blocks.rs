//! Build a structured document from a markup Node tree.
//!
//! The walk keeps a block context (quote, list membership, list depth) and,
//! inside text, a span state (active marks and link). Inline content between
//! block elements becomes one text block; an image inside text splits the
//! text around it. What the [`BlockContentSchema`] does not allow is dropped,
//! keeping any text it carried.

use std::collections::BTreeSet;

use blockdown_core::{
    next_key, Annotation, BlockStyle, CodeBlock, DecoratorMark, Document, ImageBlock, InlineSpan,
    ListInfo, ListKind, StructuredNode, TextBlock,
};

use crate::node::Node;
use crate::schema::{AnnotationType, BlockContentSchema, ObjectType};
use crate::utilities::{collapse_whitespace, language_from_class};

/// Elements handled at block level
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Plain containers, unwrapped silently
const CONTAINERS: &[&str] = &[
    "article", "body", "div", "html", "main", "section",
];

/// Elements dropped with their content
const SKIPPED_ELEMENTS: &[&str] = &["head", "noscript", "script", "style", "template", "title"];

/// Build a document from markup, assigning a fresh key to every block
pub fn build_document(root: &Node, schema: &BlockContentSchema) -> Document {
    let mut builder = DocumentBuilder {
        schema,
        blocks: Vec::new(),
    };
    builder.walk_children(root, BlockContext::default());

    let mut blocks = builder.blocks;
    for block in &mut blocks {
        block.set_key(next_key());
    }
    blocks
}

#[derive(Debug, Clone, Copy, Default)]
struct BlockContext {
    quote: bool,
    list: Option<ListInfo>,
    /// Number of enclosing lists
    depth: u32,
}

struct DocumentBuilder<'s> {
    schema: &'s BlockContentSchema,
    blocks: Vec<StructuredNode>,
}

impl<'s> DocumentBuilder<'s> {
    fn base_style(&self, ctx: BlockContext) -> BlockStyle {
        if ctx.quote {
            BlockStyle::Blockquote
        } else {
            BlockStyle::Normal
        }
    }

    /// Walk block-level children; inline runs between block elements become text blocks
    fn walk_children(&mut self, node: &Node, ctx: BlockContext) {
        let style = self.base_style(ctx);
        let mut inline = InlineCollector::new(self.schema);

        for child in node.children() {
            if child.is_element() && is_block_element(child.tag_name()) {
                self.flush(&mut inline, style, ctx);
                self.block_element(child, ctx);
            } else {
                inline.collect(child, &SpanState::default());
            }
        }

        self.flush(&mut inline, style, ctx);
    }

    /// Text content of a single element, as blocks of one style
    fn text_element(&mut self, node: &Node, style: BlockStyle, ctx: BlockContext) {
        let mut inline = InlineCollector::new(self.schema);
        for child in node.children() {
            inline.collect(child, &SpanState::default());
        }
        self.flush(&mut inline, style, ctx);
    }

    fn block_element(&mut self, node: &Node, ctx: BlockContext) {
        let tag = node.tag_name();

        match tag {
            "p" => self.text_element(node, self.base_style(ctx), ctx),

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let style = tag[1..]
                    .parse()
                    .ok()
                    .and_then(BlockStyle::heading)
                    .filter(|s| self.schema.allows_style(*s))
                    .unwrap_or_else(|| {
                        tracing::warn!(element = tag, "heading style not in schema, using normal");
                        BlockStyle::Normal
                    });
                self.text_element(node, style, ctx);
            }

            "blockquote" => {
                let quote = self.schema.allows_style(BlockStyle::Blockquote);
                if !quote {
                    tracing::warn!("blockquote style not in schema, keeping text as normal");
                }
                self.walk_children(node, BlockContext { quote, ..ctx });
            }

            "ul" | "ol" => {
                let kind = if tag == "ol" {
                    ListKind::Numbered
                } else {
                    ListKind::Bullet
                };
                let allowed = self.schema.allows_list(kind);
                if !allowed {
                    tracing::warn!(
                        list = kind.wire_name(),
                        "list kind not in schema, keeping items as text"
                    );
                }

                let item_ctx = BlockContext {
                    list: allowed.then_some(ListInfo {
                        kind,
                        nesting_level: ctx.depth,
                    }),
                    depth: ctx.depth + 1,
                    ..ctx
                };
                for li in node.element_children().filter(|c| c.tag_name() == "li") {
                    self.walk_children(li, item_ctx);
                }
            }

            "pre" => {
                if !self.schema.allows_type(ObjectType::Code) {
                    tracing::warn!("code blocks not in schema, dropping");
                    return;
                }
                let code_node = node.element_children().find(|c| c.tag_name() == "code");
                let language = code_node
                    .and_then(|c| c.attr("class"))
                    .or_else(|| node.attr("class"))
                    .and_then(language_from_class);
                let mut code = code_node.unwrap_or(node).text_content();
                if code.ends_with('\n') {
                    code.pop();
                }
                self.blocks
                    .push(CodeBlock::new(language, code).into());
            }

            "hr" => tracing::warn!("dropping thematic break"),

            _ if SKIPPED_ELEMENTS.contains(&tag) => {}

            _ if CONTAINERS.contains(&tag) => self.walk_children(node, ctx),

            _ => {
                tracing::warn!(element = tag, "unsupported element, keeping its content");
                self.walk_children(node, ctx);
            }
        }
    }

    /// Turn collected pieces into blocks
    fn flush(&mut self, inline: &mut InlineCollector, style: BlockStyle, ctx: BlockContext) {
        for piece in inline.take_pieces() {
            match piece {
                Piece::Spans(children) => self.blocks.push(
                    TextBlock {
                        key: None,
                        style,
                        list: ctx.list,
                        children,
                    }
                    .into(),
                ),
                Piece::Image(image) => {
                    if self.schema.allows_type(ObjectType::Image) {
                        self.blocks.push(image.into());
                    } else {
                        tracing::warn!(asset = %image.asset, "images not in schema, dropping");
                    }
                }
            }
        }
    }
}

fn is_block_element(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag) || SKIPPED_ELEMENTS.contains(&tag)
}

/// Marks and link applied to text at the current position
#[derive(Debug, Clone, Default)]
struct SpanState {
    marks: BTreeSet<DecoratorMark>,
    annotation: Option<Annotation>,
    in_code: bool,
}

enum Piece {
    Spans(Vec<InlineSpan>),
    Image(ImageBlock),
}

/// Gathers spans for one text block, splitting at images
struct InlineCollector<'s> {
    schema: &'s BlockContentSchema,
    pieces: Vec<Piece>,
    spans: Vec<InlineSpan>,
}

impl<'s> InlineCollector<'s> {
    fn new(schema: &'s BlockContentSchema) -> Self {
        Self {
            schema,
            pieces: Vec::new(),
            spans: Vec::new(),
        }
    }

    fn collect(&mut self, node: &Node, state: &SpanState) {
        if node.is_text() {
            if state.in_code {
                self.push_text(node.text_value(), state);
            } else {
                self.push_text(&collapse_whitespace(node.text_value()), state);
            }
            return;
        }

        let tag = node.tag_name();
        match tag {
            "strong" | "b" => self.with_mark(node, state, DecoratorMark::Bold),
            "em" | "i" => self.with_mark(node, state, DecoratorMark::Italic),
            "code" | "kbd" | "samp" => self.with_mark(node, state, DecoratorMark::Code),
            "u" => self.with_mark(node, state, DecoratorMark::Underline),
            "del" | "s" | "strike" => self.with_mark(node, state, DecoratorMark::Strikethrough),
            "span"
                if node
                    .style("text-decoration")
                    .is_some_and(|v| v.contains("underline")) =>
            {
                self.with_mark(node, state, DecoratorMark::Underline)
            }
            "a" => self.link(node, state),
            "br" => self.push_break(state),
            "img" => self.push_image(node),
            _ if SKIPPED_ELEMENTS.contains(&tag) => {}
            _ => self.collect_children(node, state),
        }
    }

    fn collect_children(&mut self, node: &Node, state: &SpanState) {
        for child in node.children() {
            self.collect(child, state);
        }
    }

    fn with_mark(&mut self, node: &Node, state: &SpanState, mark: DecoratorMark) {
        let mut inner = state.clone();
        if mark == DecoratorMark::Code {
            inner.in_code = true;
        }
        if self.schema.allows_decorator(mark) {
            inner.marks.insert(mark);
        } else {
            tracing::debug!(mark = mark.wire_name(), "mark not in schema, keeping text");
        }
        self.collect_children(node, &inner);
    }

    fn link(&mut self, node: &Node, state: &SpanState) {
        let href = node.attr("href").map(str::trim).filter(|h| !h.is_empty());
        let mut inner = state.clone();

        match href {
            Some(url) if self.schema.allows_annotation(AnnotationType::Link) => {
                let mut annotation = Annotation::external(url);
                annotation.open_in_new_tab = node.attr("target") == Some("_blank");
                inner.annotation = Some(annotation);
            }
            Some(_) => tracing::debug!("link annotation not in schema, keeping text"),
            None => {}
        }

        self.collect_children(node, &inner);
    }

    fn push_text(&mut self, text: &str, state: &SpanState) {
        let text = if !state.in_code && self.at_space_boundary() {
            text.trim_start_matches(' ')
        } else {
            text
        };
        if text.is_empty() {
            return;
        }

        match self.spans.last_mut() {
            Some(last) if last.marks == state.marks && last.annotation == state.annotation => {
                last.text.push_str(text)
            }
            _ => self.spans.push(InlineSpan {
                text: text.to_string(),
                marks: state.marks.clone(),
                annotation: state.annotation.clone(),
            }),
        }
    }

    /// Whether collapsed whitespace should be dropped here: at the start of
    /// the text, after a space, or after a line break
    fn at_space_boundary(&self) -> bool {
        self.spans
            .last()
            .map_or(true, |s| s.text.ends_with(' ') || s.text.ends_with('\n'))
    }

    fn push_break(&mut self, state: &SpanState) {
        self.trim_trailing_spaces();
        self.push_text("\n", state);
    }

    fn push_image(&mut self, node: &Node) {
        let src = node.attr("src").map(str::trim).unwrap_or("");
        if src.is_empty() {
            tracing::warn!("dropping image without a source");
            return;
        }

        self.finish_spans();
        let mut image = ImageBlock::new(src);
        image.alt_text = node.attr("alt").filter(|a| !a.is_empty()).map(str::to_string);
        image.caption = node.attr("title").filter(|t| !t.is_empty()).map(str::to_string);
        self.pieces.push(Piece::Image(image));
    }

    fn trim_trailing_spaces(&mut self) {
        while let Some(last) = self.spans.last_mut() {
            if last.marks.contains(&DecoratorMark::Code) {
                return;
            }
            let end = last.text.trim_end_matches(' ').len();
            last.text.truncate(end);
            if !last.text.is_empty() {
                return;
            }
            self.spans.pop();
        }
    }

    /// Close the current run of spans
    fn finish_spans(&mut self) {
        self.trim_trailing_spaces();
        let spans = std::mem::take(&mut self.spans);
        if spans.iter().any(|s| !s.text.trim().is_empty()) {
            self.pieces.push(Piece::Spans(spans));
        }
    }

    fn take_pieces(&mut self) -> Vec<Piece> {
        self.finish_spans();
        std::mem::take(&mut self.pieces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use pretty_assertions::assert_eq;

    fn build(html: &str) -> Document {
        build_document(&parse_html(html), &BlockContentSchema::default())
    }

    fn text_block(node: &StructuredNode) -> &TextBlock {
        match node {
            StructuredNode::Text(block) => block,
            other => panic!("expected text block, got {other:?}"),
        }
    }

    #[test]
    fn test_styles() {
        let doc =
            build("<h1>Title</h1>\n<p>Body</p>\n<blockquote>\n<p>Quoted</p>\n</blockquote>\n");
        assert_eq!(doc.len(), 3);
        assert_eq!(text_block(&doc[0]).style, BlockStyle::H1);
        assert_eq!(text_block(&doc[1]).style, BlockStyle::Normal);
        assert_eq!(text_block(&doc[2]).style, BlockStyle::Blockquote);
        assert_eq!(text_block(&doc[2]).plain_text(), "Quoted");
    }

    #[test]
    fn test_marks_and_links() {
        let doc = build(
            "<p>a <strong>b <em>c</em></strong> \
             <a href=\"https://x.com\" target=\"_blank\">d</a> <del>e</del><u>f</u></p>",
        );
        let block = text_block(&doc[0]);
        assert_eq!(
            block.children,
            vec![
                InlineSpan::plain("a "),
                InlineSpan::plain("b ").with_mark(DecoratorMark::Bold),
                InlineSpan::plain("c").with_marks([DecoratorMark::Bold, DecoratorMark::Italic]),
                InlineSpan::plain(" "),
                InlineSpan::plain("d")
                    .with_annotation(Annotation::external("https://x.com").in_new_tab()),
                InlineSpan::plain(" "),
                InlineSpan::plain("e").with_mark(DecoratorMark::Strikethrough),
                InlineSpan::plain("f").with_mark(DecoratorMark::Underline),
            ]
        );
    }

    #[test]
    fn test_empty_href_has_no_annotation() {
        let doc = build("<p><a href=\"\">post</a></p>");
        assert_eq!(text_block(&doc[0]).children, vec![InlineSpan::plain("post")]);
    }

    #[test]
    fn test_line_breaks() {
        let doc = build("<p>line one<br />\nline two</p>");
        assert_eq!(text_block(&doc[0]).plain_text(), "line one\nline two");
    }

    #[test]
    fn test_whitespace_collapses() {
        let doc = build("<p>  a \n b  <em> c </em> d </p>");
        assert_eq!(text_block(&doc[0]).plain_text(), "a b c d");
    }

    #[test]
    fn test_nested_lists() {
        let doc = build(
            "<ul>\n<li>a\n<ol>\n<li>a1</li>\n</ol>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n",
        );
        let lists: Vec<_> = doc.iter().map(|n| (n.list(), text_block(n).plain_text())).collect();
        assert_eq!(
            lists,
            vec![
                (Some(ListInfo { kind: ListKind::Bullet, nesting_level: 0 }), "a".to_string()),
                (Some(ListInfo { kind: ListKind::Numbered, nesting_level: 1 }), "a1".to_string()),
                (Some(ListInfo { kind: ListKind::Bullet, nesting_level: 0 }), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_code_block() {
        let doc = build("<pre><code class=\"language-rust\">fn main() {\n\n}\n</code></pre>\n");
        assert_eq!(
            doc[0],
            StructuredNode::Code(CodeBlock {
                key: doc[0].key().map(str::to_string),
                ..CodeBlock::new(Some("rust"), "fn main() {\n\n}")
            })
        );
    }

    #[test]
    fn test_image_splits_paragraph() {
        let doc = build("<p>before <img src=\"cat.png\" alt=\"Cat\" title=\"Meow\" /> after</p>");
        assert_eq!(doc.len(), 3);
        assert_eq!(text_block(&doc[0]).plain_text(), "before");
        match &doc[1] {
            StructuredNode::Image(image) => {
                assert_eq!(image.asset, "cat.png");
                assert_eq!(image.alt_text.as_deref(), Some("Cat"));
                assert_eq!(image.caption.as_deref(), Some("Meow"));
            }
            other => panic!("expected image, got {other:?}"),
        }
        assert_eq!(text_block(&doc[2]).plain_text(), "after");
    }

    #[test]
    fn test_lone_image_is_image_block() {
        let doc = build("<p><img src=\"cat.png\" alt=\"\" /></p>");
        assert_eq!(doc.len(), 1);
        assert!(matches!(&doc[0], StructuredNode::Image(i) if i.alt_text.is_none()));
    }

    #[test]
    fn test_unsupported_content_dropped() {
        let doc = build("<p>a</p><hr /><script>x()</script><table><tr><td>cell</td></tr></table>");
        let texts: Vec<_> = doc.iter().map(|n| text_block(n).plain_text()).collect();
        assert_eq!(texts, vec!["a".to_string(), "cell".to_string()]);
    }

    #[test]
    fn test_keys_are_unique() {
        let doc = build("<p>a</p><p>b</p><p>c</p>");
        let keys: BTreeSet<_> = doc.iter().filter_map(|n| n.key()).collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_schema_restricts_output() {
        let html = "<h2><strong>Bold</strong> title</h2><ul><li>item</li></ul>\
                    <pre><code>x</code></pre>";
        let doc = build_document(&parse_html(html), &BlockContentSchema::plain());
        assert_eq!(doc.len(), 2);
        let heading = text_block(&doc[0]);
        assert_eq!(heading.style, BlockStyle::Normal);
        assert_eq!(heading.children, vec![InlineSpan::plain("Bold title")]);
        assert_eq!(doc[1].list(), None);
    }
}
