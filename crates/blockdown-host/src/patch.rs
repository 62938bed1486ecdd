//! Field snapshots read from the host and patches written back to it.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::FieldNames;

/// Current values of a document's two content fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSnapshot {
    /// Stored block array
    pub content: Option<Value>,
    pub markdown_content: Option<String>,
}

impl FieldSnapshot {
    /// Read both content fields from a document's JSON form
    pub fn from_document(document: &Value, fields: &FieldNames) -> Self {
        let content = document.get(&fields.content).filter(|v| !v.is_null()).cloned();
        let markdown_content = match document.get(&fields.markdown_content) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::warn!(
                    field = %fields.markdown_content,
                    value = %other,
                    "markdown field is not a string"
                );
                None
            }
        };
        Self {
            content,
            markdown_content,
        }
    }
}

/// A single field mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Patch {
    Set { field: String, value: Value },
}

impl Patch {
    pub fn set(field: impl Into<String>, value: Value) -> Self {
        Patch::Set {
            field: field.into(),
            value,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Patch::Set { field, .. } => field,
        }
    }

    /// The host's mutation form, e.g. `{"set": {"markdownContent": "..."}}`
    pub fn to_mutation(&self) -> Value {
        match self {
            Patch::Set { field, value } => {
                let mut set = serde_json::Map::new();
                set.insert(field.clone(), value.clone());
                json!({ "set": set })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_snapshot_from_document() {
        let document = json!({
            "_id": "drafts.abc",
            "content": [{"_type": "block"}],
            "markdownContent": null
        });
        let snapshot = FieldSnapshot::from_document(&document, &FieldNames::default());
        assert_eq!(snapshot.content, Some(json!([{"_type": "block"}])));
        assert_eq!(snapshot.markdown_content, None);
    }

    #[test]
    fn test_snapshot_custom_fields() {
        let fields = FieldNames {
            markdown_content: "body".to_string(),
            ..FieldNames::default()
        };
        let snapshot = FieldSnapshot::from_document(&json!({"body": "# Hi"}), &fields);
        assert_eq!(snapshot.content, None);
        assert_eq!(snapshot.markdown_content.as_deref(), Some("# Hi"));
    }

    #[test]
    fn test_mutation_form() {
        let patch = Patch::set("markdownContent", json!("## Title"));
        assert_eq!(patch.field(), "markdownContent");
        assert_eq!(patch.to_mutation(), json!({"set": {"markdownContent": "## Title"}}));
    }
}
