//! Converts a document's content when its editing mode is switched.
//!
//! The coordinator remembers the last mode it saw. When the mode changes it
//! converts the field being left into the field being entered and hands the
//! host a single patch. At most one conversion runs at a time; a switch that
//! arrives while one is in flight is ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use blockdown::ConversionService;
use blockdown_core::portable;
use serde_json::Value;

use crate::config::{FieldNames, HostConfig};
use crate::mode::ContentMode;
use crate::patch::{FieldSnapshot, Patch};
use crate::HostError;

const DRAFT_PREFIX: &str = "drafts.";

/// The editing host, which accepts patches for a document
#[async_trait]
pub trait DocumentHost: Send + Sync {
    async fn apply(&self, document_id: &str, patches: Vec<Patch>) -> Result<(), HostError>;
}

/// What a mode change led to
#[derive(Debug)]
pub enum Outcome {
    /// The document type is not converted
    Skipped,
    /// First mode seen; nothing to convert from
    Recorded,
    /// Mode did not change
    Unchanged,
    /// Another conversion was in flight
    Busy,
    /// Conversion produced nothing to write
    NoPatch,
    Applied(Patch),
    Failed(HostError),
}

/// Published id for a document, without the draft prefix
pub fn published_id(document_id: &str) -> &str {
    document_id.strip_prefix(DRAFT_PREFIX).unwrap_or(document_id)
}

/// Decide which patch, if any, a switch from `previous` to `new` needs.
///
/// An empty source converts to an empty value. A non-empty source that
/// converts to nothing leaves the destination untouched.
pub fn plan_conversion(
    previous: ContentMode,
    new: ContentMode,
    snapshot: &FieldSnapshot,
    service: &ConversionService,
    fields: &FieldNames,
) -> Option<Patch> {
    match (previous, new) {
        (ContentMode::Structured, ContentMode::Markdown) => {
            let content = snapshot.content.as_ref().unwrap_or(&Value::Null);
            let source_is_empty = match content {
                Value::Null => true,
                Value::Array(blocks) => blocks.is_empty(),
                other => {
                    tracing::warn!(
                        kind = portable::value_kind(other),
                        "structured content is not a block array, leaving markdown unchanged"
                    );
                    return None;
                }
            };
            let markdown = service.serialize_value(content);
            if markdown.is_empty() && !source_is_empty {
                tracing::warn!(
                    "structured content serialized to nothing, leaving markdown unchanged"
                );
                return None;
            }
            Some(Patch::set(&fields.markdown_content, Value::String(markdown)))
        }
        (ContentMode::Markdown, ContentMode::Structured) => {
            let markdown = snapshot.markdown_content.as_deref().unwrap_or("");
            let doc = service.parse(markdown);
            if doc.is_empty() && !markdown.trim().is_empty() {
                tracing::warn!("markdown parsed to no blocks, leaving content unchanged");
                return None;
            }
            match portable::to_value(&doc) {
                Ok(value) => Some(Patch::set(&fields.content, value)),
                Err(err) => {
                    tracing::error!(error = %err, "failed to encode parsed blocks");
                    None
                }
            }
        }
        _ => None,
    }
}

/// Clears the in-flight flag when dropped
struct ConversionGuard<'a>(&'a AtomicBool);

impl<'a> ConversionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ConversionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Watches one editing session's mode field and converts on change
pub struct ModeSwitchCoordinator<H> {
    config: HostConfig,
    service: ConversionService,
    host: H,
    previous: Mutex<Option<ContentMode>>,
    converting: AtomicBool,
}

impl<H: DocumentHost> ModeSwitchCoordinator<H> {
    pub fn new(config: HostConfig, service: ConversionService, host: H) -> Self {
        Self {
            config,
            service,
            host,
            previous: Mutex::new(None),
            converting: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Whether a conversion is currently in flight
    pub fn is_converting(&self) -> bool {
        self.converting.load(Ordering::Acquire)
    }

    /// Handle an observed value of the mode field
    pub async fn on_mode_changed(
        &self,
        document_id: &str,
        document_type: &str,
        new_mode: ContentMode,
        snapshot: &FieldSnapshot,
    ) -> Outcome {
        if !self.config.handles(document_type) {
            tracing::debug!(document_type, "document type not converted");
            return Outcome::Skipped;
        }

        let Some(_guard) = ConversionGuard::acquire(&self.converting) else {
            tracing::debug!(
                document_id,
                mode = new_mode.wire_name(),
                "conversion in flight, ignoring mode change"
            );
            return Outcome::Busy;
        };

        let previous = {
            let mut previous = self.previous.lock().unwrap_or_else(|e| e.into_inner());
            previous.replace(new_mode)
        };
        let Some(previous) = previous else {
            tracing::debug!(mode = new_mode.wire_name(), "recorded initial mode");
            return Outcome::Recorded;
        };
        if previous == new_mode {
            return Outcome::Unchanged;
        }

        tracing::debug!(
            document_id,
            from = previous.wire_name(),
            to = new_mode.wire_name(),
            "converting content"
        );
        let (service, fields) = (&self.service, &self.config.fields);
        let Some(patch) = plan_conversion(previous, new_mode, snapshot, service, fields) else {
            return Outcome::NoPatch;
        };

        let id = published_id(document_id);
        match self.host.apply(id, vec![patch.clone()]).await {
            Ok(()) => Outcome::Applied(patch),
            Err(err) => {
                tracing::error!(document_id = id, error = %err, "failed to apply conversion patch");
                Outcome::Failed(err)
            }
        }
    }
}
