//! Resolution contexts.
//!
//! The same file can be reached from entry points that substitute different
//! content for some URLs (an editor's unsaved buffer, a test harness stubbing
//! a dependency). A [`ResolutionContext`] is that set of substitutions, and
//! resolved documents are cached per context.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use weft_core::DocumentUrl;

/// Fingerprint of a context's override set.
///
/// Two contexts have the same id exactly when they override the same URLs
/// with the same content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(blake3::Hash);

impl ContextId {
    fn of(overrides: &BTreeMap<DocumentUrl, Arc<str>>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for (url, content) in overrides {
            // Length prefixes keep ("ab", "c") and ("a", "bc") apart.
            hasher.update(&(url.as_str().len() as u64).to_le_bytes());
            hasher.update(url.as_str().as_bytes());
            hasher.update(&(content.len() as u64).to_le_bytes());
            hasher.update(content.as_bytes());
        }
        Self(hasher.finalize())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex()[..12])
    }
}

/// A set of content overrides applied while resolving documents.
///
/// The default context overrides nothing: every URL is read through the
/// analyzer's loader.
#[derive(Clone)]
pub struct ResolutionContext {
    overrides: BTreeMap<DocumentUrl, Arc<str>>,
    id: ContextId,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `url` instead of asking the loader.
    pub fn with_override(mut self, url: DocumentUrl, content: impl Into<Arc<str>>) -> Self {
        self.overrides.insert(url, content.into());
        self.id = ContextId::of(&self.overrides);
        self
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn is_default(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Whether this context substitutes content for `url`.
    pub fn overrides(&self, url: &DocumentUrl) -> bool {
        self.overrides.contains_key(url)
    }

    pub fn override_for(&self, url: &DocumentUrl) -> Option<&Arc<str>> {
        self.overrides.get(url)
    }

    pub fn overridden_urls(&self) -> impl Iterator<Item = &DocumentUrl> {
        self.overrides.keys()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        let overrides = BTreeMap::new();
        let id = ContextId::of(&overrides);
        Self { overrides, id }
    }
}

impl PartialEq for ResolutionContext {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResolutionContext {}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("id", &self.id)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> DocumentUrl {
        DocumentUrl::new(raw).unwrap()
    }

    #[test]
    fn equal_override_sets_are_equal_contexts() {
        let a = ResolutionContext::new()
            .with_override(url("a.js"), "export {}")
            .with_override(url("b.js"), "export {}");
        let b = ResolutionContext::new()
            .with_override(url("b.js"), "export {}")
            .with_override(url("a.js"), "export {}");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, ResolutionContext::default());
    }

    #[test]
    fn content_is_part_of_the_identity() {
        let a = ResolutionContext::new().with_override(url("a.js"), "1");
        let b = ResolutionContext::new().with_override(url("a.js"), "2");
        assert_ne!(a.id(), b.id());

        let split_one = ResolutionContext::new().with_override(url("ab.js"), "c");
        let split_two = ResolutionContext::new().with_override(url("a.js"), "bc");
        assert_ne!(split_one.id(), split_two.id());
    }

    #[test]
    fn default_context_overrides_nothing() {
        let context = ResolutionContext::default();
        assert!(context.is_default());
        assert!(!context.overrides(&url("a.js")));
        assert_eq!(context.id(), ResolutionContext::new().id());
    }
}
