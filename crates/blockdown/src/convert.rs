//! Convert a markup Node tree to the Markdown AST
//!
//! Block elements map to [`Block`]s; runs of inline content between them
//! are gathered into paragraphs. Inline elements consult the [`Rules`]
//! first, so strikethrough, underline and any custom rules take precedence
//! over the built-in mappings.

use blockdown_core::{inlines_are_blank, Block, Inline, ListItem, Options};

use crate::node::{Node, NodeRef, NodeType};
use crate::rules::Rules;
use crate::utilities::{collapse_whitespace, escape_alt, escape_markdown, language_from_class};

/// Elements converted at block level
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td",
    "tfoot", "th", "thead", "tr", "ul",
];

/// Elements dropped with their content
const SKIPPED_ELEMENTS: &[&str] = &["head", "noscript", "script", "style", "template", "title"];

struct Context<'a> {
    rules: &'a Rules,
    options: &'a Options,
}

/// Convert a Node tree to a Markdown AST document
pub fn convert(root: &Node, rules: &Rules, options: &Options) -> Block {
    let ctx = Context { rules, options };

    match root.node_type {
        NodeType::Element if is_block_element(root) => Block::Document(convert_block(root, &ctx)),
        _ => {
            let mut container = Node::element("div");
            container.add_child(root.clone());
            Block::Document(convert_children(&container, &ctx))
        }
    }
}

fn is_block_element(node: &Node) -> bool {
    node.is_element()
        && (BLOCK_ELEMENTS.contains(&node.tag_name())
            || SKIPPED_ELEMENTS.contains(&node.tag_name()))
}

/// Convert children at block level, gathering inline runs into paragraphs
fn convert_children(node: &Node, ctx: &Context) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<Inline> = Vec::new();

    for child in node.children() {
        if is_block_element(child) {
            flush_paragraph(&mut pending, &mut blocks);
            blocks.extend(convert_block(child, ctx));
        } else if child.is_element() && child.tag_name() == "img" {
            // Images between blocks stand alone
            flush_paragraph(&mut pending, &mut blocks);
            blocks.extend(convert_image(child).map(|image| Block::Paragraph(vec![image])));
        } else {
            pending.extend(convert_inline(child, node.tag_name(), ctx));
        }
    }

    flush_paragraph(&mut pending, &mut blocks);
    blocks
}

fn flush_paragraph(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    let inlines = finish_inlines(std::mem::take(pending));
    if !inlines_are_blank(&inlines) {
        blocks.push(Block::Paragraph(inlines));
    }
}

/// Convert a block element; containers yield their children's blocks
fn convert_block(node: &Node, ctx: &Context) -> Vec<Block> {
    let tag = node.tag_name();

    match tag {
        "p" => {
            let inlines = block_inlines(node, ctx);
            if inlines_are_blank(&inlines) {
                Vec::new()
            } else {
                vec![Block::Paragraph(inlines)]
            }
        }

        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse().unwrap_or(1);
            let content = block_inlines(node, ctx);
            if inlines_are_blank(&content) {
                Vec::new()
            } else {
                vec![Block::Heading { level, content }]
            }
        }

        "blockquote" => {
            let blocks = convert_children(node, ctx);
            if blocks.is_empty() {
                Vec::new()
            } else {
                vec![Block::BlockQuote(blocks)]
            }
        }

        "ul" | "ol" => {
            let items = collect_list_items(node, ctx);
            if items.is_empty() {
                return Vec::new();
            }
            let start = node
                .attr("start")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1);
            vec![Block::List {
                ordered: tag == "ol",
                start,
                items,
            }]
        }

        "pre" => {
            let code_node = node.element_children().find(|c| c.tag_name() == "code");
            let language = code_node
                .and_then(|c| c.attr("class"))
                .or_else(|| node.attr("class"))
                .and_then(language_from_class)
                .map(str::to_string);
            let code = code_node.unwrap_or(node).text_content();

            vec![Block::CodeBlock { language, code }]
        }

        // No thematic break in the document model
        "hr" => Vec::new(),

        _ if SKIPPED_ELEMENTS.contains(&tag) => Vec::new(),

        // Containers, and list items outside a list
        _ => convert_children(node, ctx),
    }
}

fn collect_list_items(node: &Node, ctx: &Context) -> Vec<ListItem> {
    node.element_children()
        .filter(|child| child.tag_name() == "li")
        .map(|li| ListItem::new(convert_children(li, ctx)))
        .collect()
}

/// Inline content of a block element, tidied and escaped
fn block_inlines(node: &Node, ctx: &Context) -> Vec<Inline> {
    finish_inlines(collect_inlines(node, ctx))
}

fn collect_inlines(node: &Node, ctx: &Context) -> Vec<Inline> {
    node.children()
        .flat_map(|child| convert_inline(child, node.tag_name(), ctx))
        .collect()
}

/// Convert an inline node. Text stays unescaped until [`finish_inlines`].
fn convert_inline(node: &Node, parent_tag: &str, ctx: &Context) -> Vec<Inline> {
    if node.is_text() {
        let text = collapse_whitespace(node.text_value());
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![Inline::Text(text)]
        };
    }

    let node_ref = NodeRef::with_parent(node, parent_tag);
    if let Some(rule) = ctx.rules.for_node(&node_ref, ctx.options) {
        return wrapped(node, ctx, |inner| rule.replace(&node_ref, inner, ctx.options));
    }

    let tag = node.tag_name();
    let inline = match tag {
        "strong" | "b" => return wrapped(node, ctx, |inner| Some(Inline::Strong(inner))),

        "em" | "i" => return wrapped(node, ctx, |inner| Some(Inline::Emphasis(inner))),

        "code" | "kbd" | "samp" => {
            let code = node.text_content().replace('\n', " ");
            (!code.is_empty()).then_some(Inline::Code(code))
        }

        // An empty href is still a link: internal links render as `[text]()`
        "a" if node.has_attr("href") => Some(Inline::Link {
            content: collect_inlines(node, ctx),
            url: node.attr("href").unwrap_or("").trim().to_string(),
            title: node.attr("title").filter(|t| !t.is_empty()).map(str::to_string),
        }),

        "img" => convert_image(node),

        "br" => Some(Inline::LineBreak),

        _ if SKIPPED_ELEMENTS.contains(&tag) => None,

        // Pass-through inline containers
        _ => return collect_inlines(node, ctx),
    };

    inline.into_iter().collect()
}

/// Wrap an element's inline content, keeping edge spaces outside the wrapper
fn wrapped<F>(node: &Node, ctx: &Context, wrap: F) -> Vec<Inline>
where
    F: FnOnce(Vec<Inline>) -> Option<Inline>,
{
    let mut inner = collect_inlines(node, ctx);

    let lead = match inner.first_mut() {
        Some(Inline::Text(text)) if text.starts_with(' ') => {
            *text = text.trim_start_matches(' ').to_string();
            Some(Inline::Text(" ".to_string()))
        }
        _ => None,
    };
    let trail = match inner.last_mut() {
        Some(Inline::Text(text)) if text.ends_with(' ') => {
            let end = text.trim_end_matches(' ').len();
            text.truncate(end);
            Some(Inline::Text(" ".to_string()))
        }
        _ => None,
    };

    let core = if inlines_are_blank(&inner) {
        None
    } else {
        wrap(inner)
    };

    lead.into_iter().chain(core).chain(trail).collect()
}

fn convert_image(node: &Node) -> Option<Inline> {
    let src = node.attr("src").unwrap_or("").trim();
    if src.is_empty() {
        return None;
    }

    Some(Inline::Image {
        alt: escape_alt(node.attr("alt").unwrap_or("")),
        url: src.to_string(),
        title: node.attr("title").filter(|t| !t.is_empty()).map(str::to_string),
    })
}

/// Tidy whitespace at line edges, then escape all text
fn finish_inlines(mut inlines: Vec<Inline>) -> Vec<Inline> {
    tidy_whitespace(&mut inlines);
    while matches!(inlines.last(), Some(Inline::LineBreak)) {
        inlines.pop();
    }
    escape_inlines(inlines)
}

/// Trim spaces at the start and end of each line and collapse spaces across text nodes
fn tidy_whitespace(inlines: &mut Vec<Inline>) {
    let mut trim_next = true;

    for i in 0..inlines.len() {
        if matches!(inlines[i], Inline::LineBreak) {
            let previous = i.checked_sub(1).and_then(|p| inlines.get_mut(p));
            if let Some(Inline::Text(previous)) = previous {
                let end = previous.trim_end_matches(' ').len();
                previous.truncate(end);
            }
            trim_next = true;
            continue;
        }

        match &mut inlines[i] {
            Inline::Text(text) => {
                if trim_next {
                    *text = text.trim_start_matches(' ').to_string();
                }
                if !text.is_empty() {
                    trim_next = text.ends_with(' ');
                }
            }
            _ => trim_next = false,
        }
    }

    if let Some(Inline::Text(last)) = inlines.last_mut() {
        let end = last.trim_end_matches(' ').len();
        last.truncate(end);
    }

    inlines.retain(|inline| !matches!(inline, Inline::Text(t) if t.is_empty()));
}

fn escape_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut escaped: Vec<Inline> = Vec::with_capacity(inlines.len());

    for inline in inlines {
        let inline = escape_inline(inline);
        // `!` right before a link would turn it into an image
        if let (Inline::Link { .. }, Some(Inline::Text(previous))) = (&inline, escaped.last_mut()) {
            if previous.ends_with('!') {
                previous.insert(previous.len() - 1, '\\');
            }
        }
        escaped.push(inline);
    }
    escaped
}

fn escape_inline(inline: Inline) -> Inline {
    match inline {
        Inline::Text(text) => Inline::Text(escape_markdown(&text)),
        Inline::Strong(inner) => Inline::Strong(escape_inlines(inner)),
        Inline::Emphasis(inner) => Inline::Emphasis(escape_inlines(inner)),
        Inline::Strikethrough(inner) => Inline::Strikethrough(escape_inlines(inner)),
        Inline::Underline(inner) => Inline::Underline(escape_inlines(inner)),
        Inline::Link {
            content,
            url,
            title,
        } => Inline::Link {
            content: escape_inlines(content),
            url,
            title,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use blockdown_core::serialize;
    use pretty_assertions::assert_eq;

    fn to_markdown(html: &str) -> String {
        let options = Options::default();
        let ast = convert(&parse_html(html), &Rules::new(), &options);
        serialize(&ast, &options)
    }

    #[test]
    fn test_paragraph_and_heading() {
        assert_eq!(to_markdown("<h2>Title</h2><p>Hello World</p>"), "## Title\n\nHello World");
    }

    #[test]
    fn test_inline_marks() {
        assert_eq!(
            to_markdown("<p><strong>bold</strong> and <em>italic</em> and <code>x*y</code></p>"),
            "**bold** and *italic* and `x*y`"
        );
    }

    #[test]
    fn test_rules_apply() {
        assert_eq!(
            to_markdown(
                "<p><del>old</del> <u>under</u> \
                 <span style=\"text-decoration: underline\">line</span></p>"
            ),
            "~~old~~ <u>under</u> <u>line</u>"
        );
    }

    #[test]
    fn test_links() {
        assert_eq!(
            to_markdown("<p>Click <a href=\"https://x.com\">here</a></p>"),
            "Click [here](https://x.com)"
        );
        assert_eq!(to_markdown("<p><a href=\"\">post</a></p>"), "[post]()");
        assert_eq!(to_markdown("<p><a>anchor</a></p>"), "anchor");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            to_markdown("<p>1. not a list *really* [x]</p>"),
            "1\\. not a list \\*really\\* \\[x\\]"
        );
        assert_eq!(to_markdown("<h1># hash</h1>"), "# \\# hash");
    }

    #[test]
    fn test_bang_before_link_stays_text() {
        assert_eq!(
            to_markdown("<p>Hi!<a href=\"https://x.com\">here</a></p>"),
            "Hi\\![here](https://x.com)"
        );
        assert_eq!(
            to_markdown("<p>Hi! <a href=\"https://x.com\">here</a></p>"),
            "Hi! [here](https://x.com)"
        );
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(to_markdown("<p>a <br> - b</p>"), "a  \n\\- b");
        assert_eq!(to_markdown("<p>trailing<br></p>"), "trailing");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(to_markdown("<p>  a \n  <em> b</em>  c  </p>"), "a *b* c");
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            to_markdown("<ul><li>a<ol><li>a1</li></ol></li><li>b</li></ul>"),
            "- a\n  1. a1\n- b"
        );
    }

    #[test]
    fn test_inline_run_between_blocks() {
        assert_eq!(
            to_markdown("plain <strong>bold</strong><p>para</p>tail"),
            "plain **bold**\n\npara\n\ntail"
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(to_markdown("<blockquote>quoted</blockquote>"), "> quoted");
    }

    #[test]
    fn test_code_block_keeps_whitespace() {
        assert_eq!(
            to_markdown(
                "<pre><code class=\"language-rust\">fn main() {\n\n    a &lt; b;\n}</code></pre>"
            ),
            "```rust\nfn main() {\n\n    a < b;\n}\n```"
        );
    }

    #[test]
    fn test_images() {
        assert_eq!(
            to_markdown(
                "<img src=\"cat.png\" alt=\"A [cat]\" title=\"Meow\"><img src=\"dog.png\" alt=\"\">"
            ),
            "![A \\[cat\\]](cat.png \"Meow\")\n\n![](dog.png)"
        );
    }

    #[test]
    fn test_skipped_elements() {
        assert_eq!(to_markdown("<p>a</p><script>alert(1)</script><hr><p>b</p>"), "a\n\nb");
    }
}
