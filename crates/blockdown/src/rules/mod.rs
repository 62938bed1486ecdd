//! Rewrite rules for markup conversion.
//!
//! Rules cover the inline elements plain CommonMark has no syntax for.
//! Custom rules are checked before the built-in ones, in insertion order.

mod extended;
mod rule;

pub use extended::extended_rules;
pub use rule::{Filter, ReplacementFn, Rule};

use blockdown_core::Options;
use indexmap::IndexMap;

use crate::node::NodeRef;

/// Collection of rules for conversion
pub struct Rules {
    /// Custom rules added by the user (checked first)
    custom_rules: IndexMap<String, Rule>,
    /// Built-in strikethrough and underline rules
    extended_rules: Vec<Rule>,
}

impl Rules {
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            extended_rules: extended_rules(),
        }
    }

    /// Add a custom rule, replacing any rule already registered under `key`
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Find the appropriate rule for a node
    pub fn for_node<'a>(&'a self, node: &NodeRef, options: &Options) -> Option<&'a Rule> {
        self.custom_rules
            .values()
            .chain(self.extended_rules.iter())
            .find(|rule| rule.filter.matches(node, options))
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use blockdown_core::Inline;

    #[test]
    fn test_builtin_rules_match() {
        let rules = Rules::new();
        let options = Options::default();

        for tag in ["del", "s", "strike", "u"] {
            let node = Node::element(tag);
            assert!(rules.for_node(&NodeRef::new(&node), &options).is_some(), "{tag}");
        }

        let plain = Node::element("span");
        assert!(rules.for_node(&NodeRef::new(&plain), &options).is_none());
    }

    #[test]
    fn test_custom_rule_checked_first() {
        let mut rules = Rules::new();
        rules.add(
            "plain-del",
            Rule::for_tag("del", |_, content, _| Some(Inline::Emphasis(content))),
        );

        let node = Node::element("del");
        let rule = rules.for_node(&NodeRef::new(&node), &Options::default()).unwrap();
        let replaced = rule.replace(
            &NodeRef::new(&node),
            vec![Inline::Text("x".to_string())],
            &Options::default(),
        );
        assert_eq!(replaced, Some(Inline::Emphasis(vec![Inline::Text("x".to_string())])));
    }
}
