use serde::{Deserialize, Serialize};

/// Which representation of a document's body is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentMode {
    #[serde(rename = "portableText")]
    Structured,
    #[serde(rename = "markdown")]
    Markdown,
}

impl ContentMode {
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Structured => "portableText",
            Self::Markdown => "markdown",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "portableText" => Some(Self::Structured),
            "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_value(ContentMode::Structured).unwrap(), json!("portableText"));
        assert_eq!(
            serde_json::from_value::<ContentMode>(json!("markdown")).unwrap(),
            ContentMode::Markdown
        );
        assert_eq!(ContentMode::from_wire_name("html"), None);
        let markdown = ContentMode::Markdown;
        assert_eq!(ContentMode::from_wire_name(markdown.wire_name()), Some(markdown));
    }
}
