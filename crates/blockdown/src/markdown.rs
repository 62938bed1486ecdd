//! Markdown → HTML markup via comrak.

use comrak::{format_html, parse_document, Arena, Options};

use crate::{ConversionError, Result};

/// CommonMark with GFM strikethrough; raw HTML passes through unsanitised
fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.render.unsafe_ = true;
    options
}

/// Render Markdown to HTML markup
pub fn markdown_to_html(markdown: &str) -> Result<String> {
    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, markdown, &options);

    let mut html: Vec<u8> = Vec::new();
    format_html(root, &options, &mut html)?;

    String::from_utf8(html).map_err(|e| ConversionError::Markup(e.to_string()))
}
