//! Markdown AST serialization
//!
//! Converts Markdown AST nodes into Markdown text.

use crate::ast::{Block, Inline, ListItem};
use crate::options::{HeadingStyle, Options};

/// Serialize a block to Markdown string
pub fn serialize(block: &Block, options: &Options) -> String {
    let mut output = String::with_capacity(4096);
    serialize_block(block, options, &mut output);

    trim_newlines(&mut output);
    output
}

fn serialize_block(block: &Block, options: &Options, out: &mut String) {
    match block {
        Block::Document(blocks) => serialize_blocks(blocks, options, out),

        Block::Heading { level, content } => serialize_heading(*level, content, options, out),

        Block::Paragraph(inlines) => {
            let start_len = out.len();
            serialize_inlines(inlines, options, out);
            if out[start_len..].trim().is_empty() {
                out.truncate(start_len);
            } else {
                out.push_str("\n\n");
            }
        }

        Block::BlockQuote(blocks) => {
            let start_len = out.len();
            serialize_blocks(blocks, options, out);

            // Process the content we just wrote to add > prefixes
            let content = out[start_len..].trim_end().to_string();
            out.truncate(start_len);

            for (i, line) in content.lines().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push('>');
                if !line.is_empty() {
                    out.push(' ');
                    out.push_str(line);
                }
            }
            out.push_str("\n\n");
        }

        Block::List {
            ordered,
            start,
            items,
        } => serialize_list(*ordered, *start, items, options, out),

        Block::CodeBlock { language, code } => {
            serialize_code_block(language.as_deref(), code, options, out)
        }
    }
}

fn serialize_blocks(blocks: &[Block], options: &Options, out: &mut String) {
    for block in blocks {
        if !block.is_blank() {
            serialize_block(block, options, out);
        }
    }
}

fn serialize_heading(level: u8, content: &[Inline], options: &Options, out: &mut String) {
    let start_len = out.len();
    serialize_inlines(content, options, out);

    if out[start_len..].trim().is_empty() {
        out.truncate(start_len);
        return;
    }

    // A heading is a single line
    let mut text = out[start_len..].replace("  \n", " ");
    out.truncate(start_len);
    let level = level.clamp(1, 6);

    match options.heading_style {
        HeadingStyle::Setext if level <= 2 => {
            let underline = if level == 1 { '=' } else { '-' };
            out.push_str(&text);
            out.push('\n');
            for _ in 0..text.chars().count() {
                out.push(underline);
            }
            out.push_str("\n\n");
        }
        _ => {
            // A trailing `#` run after a space would read as the closing sequence
            let body = text.trim_end_matches('#');
            if body.len() < text.len() && body.ends_with(|c| c == ' ' || c == '\t') {
                text.insert(body.len(), '\\');
            }
            for _ in 0..level {
                out.push('#');
            }
            out.push(' ');
            out.push_str(&text);
            out.push_str("\n\n");
        }
    }
}

fn serialize_list(
    ordered: bool,
    start: u32,
    items: &[ListItem],
    options: &Options,
    out: &mut String,
) {
    for (i, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}.", start + i as u32)
        } else {
            options.bullet_list_marker.to_string()
        };

        out.push_str(&marker);
        serialize_list_item(item, options, marker.len() + 1, out);
    }

    out.push('\n');
}

fn serialize_list_item(item: &ListItem, options: &Options, prefix_len: usize, out: &mut String) {
    let mut content = String::new();
    let mut previous_was_paragraph = false;

    for block in &item.content {
        let is_paragraph = matches!(block, Block::Paragraph(_));
        let mut piece = String::new();
        match block {
            Block::Paragraph(inlines) => serialize_inlines(inlines, options, &mut piece),
            _ => {
                serialize_block(block, options, &mut piece);
                trim_newlines(&mut piece);
            }
        }
        if piece.trim().is_empty() {
            continue;
        }

        if !content.is_empty() {
            // Two paragraphs in a row need a blank line, anything else nests tightly
            content.push_str(if previous_was_paragraph && is_paragraph {
                "\n\n"
            } else {
                "\n"
            });
        }
        content.push_str(&piece);
        previous_was_paragraph = is_paragraph;
    }

    if content.is_empty() {
        out.push('\n');
        return;
    }

    out.push(' ');
    let continuation_indent = " ".repeat(prefix_len);

    for (i, line) in content.lines().enumerate() {
        if i > 0 && !line.is_empty() {
            out.push_str(&continuation_indent);
        }
        out.push_str(line);
        out.push('\n');
    }
}

fn serialize_code_block(language: Option<&str>, code: &str, options: &Options, out: &mut String) {
    // The fence must be longer than any fence-like run inside the code
    let mut fence = options.fence.clone();
    let fence_char = fence.chars().next().unwrap_or('`');
    while code.contains(fence.as_str()) {
        fence.push(fence_char);
    }

    out.push_str(&fence);
    out.push_str(language.unwrap_or(""));
    out.push('\n');
    out.push_str(code);
    out.push('\n');
    out.push_str(&fence);
    out.push_str("\n\n");
}

fn serialize_inlines(inlines: &[Inline], options: &Options, out: &mut String) {
    serialize_run(inlines, None, None, options, out);
}

/// Serialize inlines that sit between `before` and `after`
fn serialize_run(
    inlines: &[Inline],
    before: Option<char>,
    after: Option<char>,
    options: &Options,
    out: &mut String,
) {
    let start = out.len();
    for (i, inline) in inlines.iter().enumerate() {
        let previous = if out.len() > start {
            out.chars().next_back()
        } else {
            before
        };
        let next = inlines[i + 1..]
            .iter()
            .find_map(|n| leading_char(n, options))
            .or(after);
        serialize_inline(inline, previous, next, options, out);
    }
}

/// First character an inline writes
fn leading_char(inline: &Inline, options: &Options) -> Option<char> {
    match inline {
        Inline::Text(text) => text.chars().next(),
        Inline::Strong(_) => options.strong_delimiter.chars().next(),
        Inline::Emphasis(_) => Some(options.em_delimiter),
        Inline::Strikethrough(_) => options.strikethrough_delimiter.chars().next(),
        Inline::Underline(_) => Some('<'),
        Inline::Code(code) => (!code.is_empty()).then_some('`'),
        Inline::Link { .. } => Some('['),
        Inline::Image { .. } => Some('!'),
        Inline::LineBreak => Some(' '),
    }
}

/// Unicode punctuation or symbol, as CommonMark counts it for flanking
fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace())
}

/// Delimiter character of an emphasis-like inline
fn delimiter_char(inline: &Inline, options: &Options) -> Option<char> {
    match inline {
        Inline::Strong(_) => options.strong_delimiter.chars().next(),
        Inline::Emphasis(_) => Some(options.em_delimiter),
        Inline::Strikethrough(_) => options.strikethrough_delimiter.chars().next(),
        _ => None,
    }
}

/// Whether `mark` delimiters around `inner` open and close between `before` and `after`
///
/// A nested run of the same character (`***both***`) counts as part of the delimiter.
fn delimiters_hold(mark: char, inner: &str, before: Option<char>, after: Option<char>) -> bool {
    let (Some(first), Some(last)) = (
        inner.trim_start_matches(mark).chars().next(),
        inner.trim_end_matches(mark).chars().next_back(),
    ) else {
        return false;
    };
    let loose = |c: Option<char>| c.map_or(true, |c| c.is_whitespace() || is_punctuation(c));

    // A neighbouring run of the same character would merge with the delimiter
    if before == Some(mark) || after == Some(mark) {
        return false;
    }
    // Underscores never open or close inside a word
    let wordy = |c: Option<char>| c.is_some_and(char::is_alphanumeric);
    if mark == '_' && (wordy(before) || wordy(after)) {
        return false;
    }

    let opens = !first.is_whitespace() && (!is_punctuation(first) || loose(before));
    let closes = !last.is_whitespace() && (!is_punctuation(last) || loose(after));
    opens && closes
}

/// Wrap content in `delimiter`, or in the raw `tag` where the delimiter would not parse back
fn serialize_wrapped(
    content: &[Inline],
    delimiter: &str,
    tag: &str,
    before: Option<char>,
    after: Option<char>,
    options: &Options,
    out: &mut String,
) {
    let Some(mark) = delimiter.chars().next() else {
        serialize_run(content, before, after, options, out);
        return;
    };

    // A nested delimiter of the same character joins ours into one run,
    // so it sees what lies outside of it
    let same = |n: Option<&Inline>| n.and_then(|n| delimiter_char(n, options)) == Some(mark);
    let inner_before = if same(content.first()) { before } else { Some(mark) };
    let inner_after = if same(content.last()) { after } else { Some(mark) };

    let mut inner = String::new();
    serialize_run(content, inner_before, inner_after, options, &mut inner);
    if inner.trim().is_empty() {
        return;
    }

    if delimiters_hold(mark, &inner, before, after) {
        out.push_str(delimiter);
        out.push_str(&inner);
        out.push_str(delimiter);
    } else {
        out.push_str(&format!("<{tag}>{inner}</{tag}>"));
    }
}

fn serialize_inline(
    inline: &Inline,
    before: Option<char>,
    after: Option<char>,
    options: &Options,
    out: &mut String,
) {
    match inline {
        Inline::Text(text) => out.push_str(text),

        Inline::Strong(content) => {
            let delimiter = options.strong_delimiter.as_str();
            serialize_wrapped(content, delimiter, "strong", before, after, options, out);
        }

        Inline::Emphasis(content) => {
            let delimiter = options.em_delimiter.to_string();
            serialize_wrapped(content, &delimiter, "em", before, after, options, out);
        }

        Inline::Strikethrough(content) => {
            let delimiter = options.strikethrough_delimiter.as_str();
            serialize_wrapped(content, delimiter, "del", before, after, options, out);
        }

        Inline::Underline(content) => {
            out.push_str("<u>");
            serialize_run(content, Some('>'), Some('<'), options, out);
            out.push_str("</u>");
        }

        Inline::Code(code) => serialize_code_span(code, out),

        Inline::Link {
            content,
            url,
            title,
        } => {
            out.push('[');
            serialize_run(content, Some('['), Some(']'), options, out);
            out.push_str("](");
            push_destination(url, out);
            push_title(title.as_deref(), out);
            out.push(')');
        }

        Inline::Image { alt, url, title } => {
            out.push_str("![");
            out.push_str(alt);
            out.push_str("](");
            push_destination(url, out);
            push_title(title.as_deref(), out);
            out.push(')');
        }

        Inline::LineBreak => out.push_str("  \n"),
    }
}

fn serialize_code_span(code: &str, out: &mut String) {
    if code.is_empty() {
        return;
    }

    let longest_run = code
        .chars()
        .fold((0, 0), |(max, current), c| {
            if c == '`' {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0;
    let backticks = "`".repeat(longest_run + 1);

    // CommonMark strips one space from each side of a padded code span
    let needs_space = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
    let space = if needs_space { " " } else { "" };

    out.push_str(&backticks);
    out.push_str(space);
    out.push_str(code);
    out.push_str(space);
    out.push_str(&backticks);
}

fn push_destination(url: &str, out: &mut String) {
    if url.chars().any(|c| c.is_whitespace() || c == '(' || c == ')') {
        out.push('<');
        out.push_str(&url.replace('<', "%3C").replace('>', "%3E"));
        out.push('>');
    } else {
        out.push_str(url);
    }
}

fn push_title(title: Option<&str>, out: &mut String) {
    if let Some(t) = title.filter(|t| !t.is_empty()) {
        out.push_str(" \"");
        out.push_str(&t.replace('\\', "\\\\").replace('"', "\\\""));
        out.push('"');
    }
}

/// Strip leading and trailing newlines in place
fn trim_newlines(s: &mut String) {
    let end = s.trim_end_matches('\n').len();
    s.truncate(end);
    let leading = s.len() - s.trim_start_matches('\n').len();
    s.drain(..leading);
}
