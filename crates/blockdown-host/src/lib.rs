//! blockdown-host - keeps a document's structured and Markdown fields in step
//!
//! A document carries its body twice: as structured blocks and as Markdown,
//! with a mode field choosing which one is edited. When the mode changes,
//! [`ModeSwitchCoordinator`] converts the field being left into the one
//! being entered and hands the editing host a patch through [`DocumentHost`].
//!
//! # Example
//!
//! ```rust
//! use blockdown_host::{plan_conversion, ContentMode, FieldSnapshot, HostConfig};
//! use blockdown::ConversionService;
//!
//! let config = HostConfig::default();
//! let snapshot = FieldSnapshot {
//!     content: None,
//!     markdown_content: Some("## Title".to_string()),
//! };
//!
//! let patch = plan_conversion(
//!     ContentMode::Markdown,
//!     ContentMode::Structured,
//!     &snapshot,
//!     &ConversionService::new(),
//!     &config.fields,
//! )
//! .unwrap();
//! assert_eq!(patch.field(), "content");
//! ```

mod config;
mod coordinator;
mod mode;
mod patch;

pub use config::{FieldNames, HostConfig};
pub use coordinator::{plan_conversion, published_id, DocumentHost, ModeSwitchCoordinator, Outcome};
pub use mode::ContentMode;
pub use patch::{FieldSnapshot, Patch};

/// Error type for host integration
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Patch rejected: {0}")]
    Patch(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, HostError>;
