//! Host configuration, loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Names of the document fields the coordinator reads and patches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldNames {
    /// Structured block content
    pub content: String,
    /// Markdown content
    pub markdown_content: String,
    /// The mode selector
    pub content_type: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            markdown_content: "markdownContent".to_string(),
            content_type: "contentType".to_string(),
        }
    }
}

/// Connection settings and document scope for the editing host.
///
/// Every key is optional; missing keys take the defaults below.
///
/// ```toml
/// projectId = "w486ji4p"
/// dataset = "production"
/// documentTypes = ["post", "page"]
///
/// [fields]
/// markdownContent = "body"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    /// Document types whose mode switches trigger a conversion
    pub document_types: Vec<String>,
    pub fields: FieldNames,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            project_id: "w486ji4p".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-10-18".to_string(),
            use_cdn: false,
            document_types: vec!["post".to_string()],
            fields: FieldNames::default(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Whether documents of this type are converted on a mode switch
    pub fn handles(&self, document_type: &str) -> bool {
        self.document_types.iter().any(|t| t == document_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.api_version, "2024-10-18");
        assert!(!config.use_cdn);
        assert!(config.handles("post"));
        assert!(!config.handles("author"));
        assert_eq!(config.fields.markdown_content, "markdownContent");
    }

    #[test]
    fn test_from_toml() {
        let config = HostConfig::from_toml_str(
            r#"
            dataset = "staging"
            documentTypes = ["post", "page"]

            [fields]
            markdownContent = "body"
            "#,
        )
        .unwrap();

        assert_eq!(config.project_id, "w486ji4p");
        assert_eq!(config.dataset, "staging");
        assert!(config.handles("page"));
        assert_eq!(config.fields.markdown_content, "body");
        assert_eq!(config.fields.content, "content");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(HostConfig::from_toml_str("").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let result = HostConfig::from_toml_str("useCdn = \"yes\"");
        assert!(matches!(result, Err(HostError::Config(_))));
    }
}
