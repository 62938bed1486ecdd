//! Hooks for turning references into URLs.

use crate::Result;

/// Resolves internal references when rendering markup.
///
/// Without a resolver, internal document links render with an empty target
/// and images use their asset reference as the source.
pub trait LinkResolver: Send + Sync {
    /// URL for a link to another document; `Ok(None)` leaves the link unresolved
    fn resolve_document(&self, target_document_id: &str) -> Result<Option<String>>;

    /// Source URL for an image asset; `Ok(None)` falls back to the asset reference
    fn resolve_image(&self, asset: &str) -> Result<Option<String>> {
        let _ = asset;
        Ok(None)
    }
}

/// Resolver that maps document ids onto a URL prefix, e.g. `/posts/`
#[derive(Debug, Clone)]
pub struct PrefixResolver {
    prefix: String,
}

impl PrefixResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl LinkResolver for PrefixResolver {
    fn resolve_document(&self, target_document_id: &str) -> Result<Option<String>> {
        Ok(Some(format!("{}{}", self.prefix, target_document_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_resolver() {
        let resolver = PrefixResolver::new("/posts/");
        assert_eq!(
            resolver.resolve_document("doc123").unwrap(),
            Some("/posts/doc123".to_string())
        );
        assert_eq!(resolver.resolve_image("image-abc").unwrap(), None);
    }
}
