//! Strikethrough and underline rules.

use blockdown_core::{inlines_are_blank, Inline};

use super::{Filter, Rule};

/// Create the built-in rules
pub fn extended_rules() -> Vec<Rule> {
    vec![strikethrough_rule(), underline_rule()]
}

fn strikethrough_rule() -> Rule {
    Rule::for_tags(&["del", "s", "strike"], |_, content, _| {
        if inlines_are_blank(&content) {
            None
        } else {
            Some(Inline::Strikethrough(content))
        }
    })
}

fn underline_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            tag == "u"
                || (tag == "span"
                    && node
                        .style("text-decoration")
                        .is_some_and(|v| v.contains("underline")))
        }),
        |_, content, _| {
            if inlines_are_blank(&content) {
                None
            } else {
                Some(Inline::Underline(content))
            }
        },
    )
}
