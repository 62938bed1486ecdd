//! JSON wire form of structured documents
//!
//! The editing host stores rich text as Portable-Text-style JSON: text
//! blocks with `children` spans whose `marks` name either a decorator or the
//! `_key` of an entry in the block's `markDefs`. This module decodes that
//! form into the typed [`document`](crate::document) model and encodes it
//! back.
//!
//! Decoding is lenient. A block that fails to deserialize is dropped with a
//! warning, unknown marks are dropped, and unknown block types are kept as
//! [`StructuredNode::Unknown`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{
    Annotation, BlockStyle, CodeBlock, DecoratorMark, Document, ImageBlock, InlineSpan, LinkTarget,
    ListInfo, ListKind, StructuredNode, TextBlock, UnknownBlock,
};
use crate::keys::next_key;
use crate::{CodecError, Result};

const TEXT_BLOCK: &str = "block";
const IMAGE_BLOCK: &str = "image";
const CODE_BLOCK: &str = "code";
const SPAN: &str = "span";
const LINK: &str = "link";

/// A block as stored by the host. Fields not relevant to a block type stay empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableBlock {
    #[serde(rename = "_type")]
    pub block_type: String,
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PortableSpan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_defs: Option<Vec<MarkDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn span_type() -> String {
    SPAN.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableSpan {
    #[serde(rename = "_type", default = "span_type")]
    pub span_type: String,
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

/// Annotation definition referenced from span marks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDef {
    #[serde(rename = "_key", default)]
    pub key: String,
    #[serde(rename = "_type")]
    pub def_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_in_new_tab: Option<bool>,
}

/// Reference to another document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<String>,
    #[serde(rename = "_ref")]
    pub reference: String,
}

/// Image asset: a reference to an uploaded asset, or a plain URL
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<String>,
    #[serde(rename = "_ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Decode a field value into a document, dropping blocks that do not deserialize
pub fn decode_document(value: &Value) -> Document {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match PortableBlock::deserialize(item) {
                Ok(block) => Some(decode_block(&block)),
                Err(err) => {
                    tracing::warn!(index, error = %err, "dropping malformed block");
                    None
                }
            })
            .collect(),
        other => {
            tracing::warn!(kind = value_kind(other), "expected an array of blocks");
            Vec::new()
        }
    }
}

/// Decode one stored block
pub fn decode_block(block: &PortableBlock) -> StructuredNode {
    match block.block_type.as_str() {
        TEXT_BLOCK => StructuredNode::Text(decode_text_block(block)),

        IMAGE_BLOCK => {
            let asset = block
                .asset
                .as_ref()
                .and_then(|a| a.reference.clone().or_else(|| a.url.clone()))
                .unwrap_or_default();
            StructuredNode::Image(ImageBlock {
                key: block.key.clone(),
                asset,
                alt_text: block.alt.clone(),
                caption: block.caption.clone(),
            })
        }

        CODE_BLOCK => StructuredNode::Code(CodeBlock {
            key: block.key.clone(),
            language: block.language.clone().filter(|l| !l.is_empty()),
            filename: block.filename.clone(),
            code: block.code.clone().unwrap_or_default(),
        }),

        other => StructuredNode::Unknown(UnknownBlock {
            key: block.key.clone(),
            type_name: other.to_string(),
            children: decode_spans(block),
        }),
    }
}

fn decode_text_block(block: &PortableBlock) -> TextBlock {
    let style = match block.style.as_deref() {
        None => BlockStyle::Normal,
        Some(name) => BlockStyle::from_wire_name(name).unwrap_or_else(|| {
            tracing::debug!(style = name, "unsupported style, using normal");
            BlockStyle::Normal
        }),
    };

    let list = block.list_item.as_deref().and_then(|name| {
        let kind = ListKind::from_wire_name(name);
        if kind.is_none() {
            tracing::debug!(list_item = name, "unsupported list kind, dropping list membership");
        }
        kind.map(|kind| ListInfo {
            kind,
            nesting_level: block.level.unwrap_or(1).saturating_sub(1),
        })
    });

    TextBlock {
        key: block.key.clone(),
        style,
        list,
        children: decode_spans(block),
    }
}

fn decode_spans(block: &PortableBlock) -> Vec<InlineSpan> {
    let defs = block.mark_defs.as_deref().unwrap_or_default();

    block
        .children
        .iter()
        .flatten()
        .filter(|span| {
            let is_span = span.span_type == SPAN;
            if !is_span {
                tracing::debug!(span_type = %span.span_type, "dropping inline object");
            }
            is_span
        })
        .map(|span| decode_span(span, defs))
        .collect()
}

fn decode_span(span: &PortableSpan, defs: &[MarkDef]) -> InlineSpan {
    let mut decoded = InlineSpan::plain(span.text.clone());

    for mark in &span.marks {
        if let Some(def) = defs.iter().find(|d| &d.key == mark) {
            match decode_annotation(def) {
                Some(annotation) if decoded.annotation.is_none() => {
                    decoded.annotation = Some(annotation)
                }
                Some(_) => tracing::debug!(mark = %mark, "span already has an annotation"),
                None => tracing::debug!(mark = %mark, "dropping unsupported annotation"),
            }
        } else if let Some(decorator) = DecoratorMark::from_wire_name(mark) {
            decoded.marks.insert(decorator);
        } else {
            tracing::debug!(mark = %mark, "dropping unrecognised mark");
        }
    }

    decoded
}

fn decode_annotation(def: &MarkDef) -> Option<Annotation> {
    if def.def_type != LINK {
        return None;
    }

    let internal = def.post.as_ref().map(|p| p.reference.clone());
    let link = match (def.link_type.as_deref(), def.href.clone(), internal) {
        (Some("post"), _, Some(target_document_id)) => LinkTarget::Internal { target_document_id },
        (_, Some(url), _) => LinkTarget::External { url },
        (_, None, Some(target_document_id)) => LinkTarget::Internal { target_document_id },
        _ => return None,
    };

    Some(Annotation {
        link,
        open_in_new_tab: def.open_in_new_tab.unwrap_or(false),
    })
}

/// Encode a document into its stored form, generating missing keys
pub fn encode_document(doc: &[StructuredNode]) -> Vec<PortableBlock> {
    doc.iter().map(encode_block).collect()
}

/// Encode one block
pub fn encode_block(node: &StructuredNode) -> PortableBlock {
    let key = Some(node.key().map(str::to_string).unwrap_or_else(next_key));

    match node {
        StructuredNode::Text(block) => {
            let (children, mark_defs) = encode_spans(&block.children);
            PortableBlock {
                block_type: TEXT_BLOCK.to_string(),
                key,
                style: Some(block.style.wire_name().to_string()),
                list_item: block.list.map(|l| l.kind.wire_name().to_string()),
                level: block.list.map(|l| l.nesting_level + 1),
                children: Some(children),
                mark_defs: Some(mark_defs),
                ..Default::default()
            }
        }

        StructuredNode::Image(image) => PortableBlock {
            block_type: IMAGE_BLOCK.to_string(),
            key,
            asset: Some(encode_asset(&image.asset)),
            alt: image.alt_text.clone(),
            caption: image.caption.clone(),
            ..Default::default()
        },

        StructuredNode::Code(code) => PortableBlock {
            block_type: CODE_BLOCK.to_string(),
            key,
            language: code.language.clone(),
            filename: code.filename.clone(),
            code: Some(code.code.clone()),
            ..Default::default()
        },

        StructuredNode::Unknown(unknown) => {
            let (children, mark_defs) = encode_spans(&unknown.children);
            PortableBlock {
                block_type: unknown.type_name.clone(),
                key,
                children: (!children.is_empty()).then_some(children),
                mark_defs: (!mark_defs.is_empty()).then_some(mark_defs),
                ..Default::default()
            }
        }
    }
}

fn encode_spans(spans: &[InlineSpan]) -> (Vec<PortableSpan>, Vec<MarkDef>) {
    let mut defs: Vec<(Annotation, MarkDef)> = Vec::new();

    let children = spans
        .iter()
        .map(|span| {
            let mut marks: Vec<String> = span
                .marks
                .iter()
                .map(|m| m.wire_name().to_string())
                .collect();

            if let Some(annotation) = &span.annotation {
                let key = match defs.iter().find(|(a, _)| a == annotation) {
                    Some((_, def)) => def.key.clone(),
                    None => {
                        let def = encode_annotation(annotation, next_key());
                        let key = def.key.clone();
                        defs.push((annotation.clone(), def));
                        key
                    }
                };
                marks.push(key);
            }

            PortableSpan {
                span_type: span_type(),
                key: Some(next_key()),
                text: span.text.clone(),
                marks,
            }
        })
        .collect();

    (children, defs.into_iter().map(|(_, def)| def).collect())
}

fn encode_annotation(annotation: &Annotation, key: String) -> MarkDef {
    let (link_type, href, post) = match &annotation.link {
        LinkTarget::External { url } => ("href", Some(url.clone()), None),
        LinkTarget::Internal { target_document_id } => (
            "post",
            None,
            Some(Reference {
                ref_type: Some("reference".to_string()),
                reference: target_document_id.clone(),
            }),
        ),
    };

    MarkDef {
        key,
        def_type: LINK.to_string(),
        link_type: Some(link_type.to_string()),
        href,
        post,
        open_in_new_tab: annotation.open_in_new_tab.then_some(true),
    }
}

fn encode_asset(asset: &str) -> AssetRef {
    if asset.contains("://") {
        AssetRef {
            url: Some(asset.to_string()),
            ..Default::default()
        }
    } else {
        AssetRef {
            ref_type: Some("reference".to_string()),
            reference: Some(asset.to_string()),
            url: None,
        }
    }
}

/// Encode a document as a JSON field value
pub fn to_value(doc: &[StructuredNode]) -> Result<Value> {
    Ok(serde_json::to_value(encode_document(doc))?)
}

/// Parse a JSON string holding an array of blocks
pub fn from_json_str(json: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(_) | Value::Null => Ok(decode_document(&value)),
        other => Err(CodecError::NotAnArray(value_kind(&other))),
    }
}

/// Serialize a document as a JSON string
pub fn to_json_string(doc: &[StructuredNode]) -> Result<String> {
    Ok(serde_json::to_string(&encode_document(doc))?)
}

/// JSON type name of a value, for diagnostics
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_text_block_with_link() {
        let value = json!([{
            "_type": "block",
            "_key": "b1",
            "style": "h2",
            "markDefs": [{
                "_key": "l1",
                "_type": "link",
                "linkType": "href",
                "href": "https://x.com"
            }],
            "children": [
                {"_type": "span", "text": "Click ", "marks": []},
                {"_type": "span", "text": "here", "marks": ["strong", "l1"]}
            ]
        }]);

        let doc = decode_document(&value);
        assert_eq!(doc.len(), 1);
        let StructuredNode::Text(block) = &doc[0] else {
            panic!("expected text block");
        };
        assert_eq!(block.key.as_deref(), Some("b1"));
        assert_eq!(block.style, BlockStyle::H2);
        assert_eq!(block.children[0], InlineSpan::plain("Click "));
        assert_eq!(
            block.children[1],
            InlineSpan::plain("here")
                .with_mark(DecoratorMark::Bold)
                .with_annotation(Annotation::external("https://x.com"))
        );
    }

    #[test]
    fn test_decode_internal_link_and_unknown_mark() {
        let value = json!([{
            "_type": "block",
            "markDefs": [{
                "_key": "p1",
                "_type": "link",
                "linkType": "post",
                "post": {"_ref": "doc123"},
                "openInNewTab": true
            }],
            "children": [{"_type": "span", "text": "post", "marks": ["p1", "sparkle"]}]
        }]);

        let doc = decode_document(&value);
        let StructuredNode::Text(block) = &doc[0] else {
            panic!("expected text block");
        };
        let span = &block.children[0];
        assert!(span.marks.is_empty());
        assert_eq!(span.annotation, Some(Annotation::internal("doc123").in_new_tab()));
    }

    #[test]
    fn test_decode_list_levels() {
        let value = json!([
            {
                "_type": "block",
                "listItem": "bullet",
                "level": 1,
                "children": [{"_type": "span", "text": "a"}]
            },
            {
                "_type": "block",
                "listItem": "number",
                "level": 2,
                "children": [{"_type": "span", "text": "b"}]
            },
            {"_type": "block", "listItem": "checkbox", "children": [{"_type": "span", "text": "c"}]}
        ]);

        let doc = decode_document(&value);
        assert_eq!(
            doc[0].list(),
            Some(ListInfo {
                kind: ListKind::Bullet,
                nesting_level: 0
            })
        );
        assert_eq!(
            doc[1].list(),
            Some(ListInfo {
                kind: ListKind::Numbered,
                nesting_level: 1
            })
        );
        assert_eq!(doc[2].list(), None);
    }

    #[test]
    fn test_malformed_blocks_are_dropped() {
        let value = json!([
            {"style": "normal"},
            {"_type": "block", "level": "deep", "children": []},
            {"_type": "code", "language": "rust", "code": "fn main() {}"}
        ]);

        let doc = decode_document(&value);
        assert_eq!(doc.len(), 1);
        assert!(matches!(
            &doc[0],
            StructuredNode::Code(c) if c.language.as_deref() == Some("rust")
        ));
    }

    #[test]
    fn test_non_array_decodes_empty() {
        assert!(decode_document(&Value::Null).is_empty());
        assert!(decode_document(&json!({"_type": "block"})).is_empty());
        assert!(matches!(
            from_json_str("{\"a\": 1}"),
            Err(CodecError::NotAnArray("object"))
        ));
    }

    #[test]
    fn test_unknown_block_type() {
        let value = json!([{"_type": "table", "_key": "t1", "rows": []}]);
        let doc = decode_document(&value);
        assert!(matches!(&doc[0], StructuredNode::Unknown(u) if u.type_name == "table"));
    }

    #[test]
    fn test_encode_shares_mark_defs() {
        let link = Annotation::external("https://x.com");
        let doc = vec![StructuredNode::from(TextBlock::paragraph(vec![
            InlineSpan::plain("a").with_annotation(link.clone()),
            InlineSpan::plain("b")
                .with_mark(DecoratorMark::Italic)
                .with_annotation(link),
        ]))];

        let encoded = encode_document(&doc);
        let block = &encoded[0];
        let defs = block.mark_defs.as_ref().unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].href.as_deref(), Some("https://x.com"));

        let children = block.children.as_ref().unwrap();
        assert_eq!(children[0].marks, vec![defs[0].key.clone()]);
        assert_eq!(children[1].marks, vec!["em".to_string(), defs[0].key.clone()]);
        assert!(block.key.is_some());
    }

    #[test]
    fn test_encode_decode_preserves_model() {
        let doc = vec![
            StructuredNode::from(TextBlock {
                key: Some("k1".to_string()),
                ..TextBlock::list_item(
                    ListKind::Numbered,
                    2,
                    vec![InlineSpan::plain("deep")
                        .with_annotation(Annotation::internal("doc123").in_new_tab())],
                )
            }),
            StructuredNode::from(ImageBlock {
                key: Some("k2".to_string()),
                ..ImageBlock::new("image-abc-200x200-png").with_alt("A cat")
            }),
        ];

        let value = to_value(&doc).unwrap();
        assert_eq!(value[0]["level"], json!(3));
        assert_eq!(value[1]["asset"]["_ref"], json!("image-abc-200x200-png"));
        assert_eq!(decode_document(&value), doc);
    }
}
