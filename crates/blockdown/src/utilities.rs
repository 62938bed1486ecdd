//! Text helpers shared by both conversion directions.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that are Markdown syntax anywhere on a line
static INLINE_SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\\*_`\[\]~<&]").unwrap());

/// Constructs that are only syntax at the start of a line
static LINE_START: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?m)^(#{1,6})( |$)").unwrap(), "\\$1$2"),
        (Regex::new(r"(?m)^([-+=>])").unwrap(), "\\$1"),
        (Regex::new(r"(?m)^(\d+)([.)])( |$)").unwrap(), "$1\\$2$3"),
    ]
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Escape text so it reads back as the same literal text
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = INLINE_SPECIAL.replace_all(text, "\\$0").into_owned();
    for (pattern, replacement) in LINE_START.iter() {
        escaped = pattern.replace_all(&escaped, *replacement).into_owned();
    }
    escaped
}

/// Escape image alt text, which sits inside `![...]`
pub fn escape_alt(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Collapse runs of whitespace into a single space
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").into_owned()
}

/// Language named by a `language-*` (or `lang-*`) class
pub fn language_from_class(class: &str) -> Option<&str> {
    class.split_whitespace().find_map(|c| {
        c.strip_prefix("language-")
            .or_else(|| c.strip_prefix("lang-"))
            .filter(|l| !l.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_inline_specials() {
        assert_eq!(escape_markdown("*test*"), "\\*test\\*");
        assert_eq!(escape_markdown("snake_case"), "snake\\_case");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("~~no~~"), "\\~\\~no\\~\\~");
        assert_eq!(escape_markdown("a <b> & c"), "a \\<b> \\& c");
        assert_eq!(escape_markdown("normal text."), "normal text.");
    }

    #[test]
    fn test_escape_line_start() {
        assert_eq!(escape_markdown("# not a heading"), "\\# not a heading");
        assert_eq!(escape_markdown("#hashtag"), "#hashtag");
        assert_eq!(escape_markdown("- not a list"), "\\- not a list");
        assert_eq!(escape_markdown("+ nor this"), "\\+ nor this");
        assert_eq!(escape_markdown("> no quote"), "\\> no quote");
        assert_eq!(escape_markdown("1. First"), "1\\. First");
        assert_eq!(escape_markdown("2) Second"), "2\\) Second");
        assert_eq!(escape_markdown("a - b"), "a - b");
        assert_eq!(escape_markdown("version 1. x"), "version 1. x");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \n\t b"), "a b");
        assert_eq!(collapse_whitespace("  lead"), " lead");
    }

    #[test]
    fn test_language_from_class() {
        assert_eq!(language_from_class("language-rust"), Some("rust"));
        assert_eq!(language_from_class("hljs lang-js"), Some("js"));
        assert_eq!(language_from_class("language-"), None);
        assert_eq!(language_from_class("plain"), None);
    }
}
