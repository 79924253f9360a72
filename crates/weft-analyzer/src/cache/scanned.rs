//! Scanned-document level of the cache.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use weft_core::{ContentHash, DocumentUrl, ScannedDocument};

use crate::context::ContextId;

#[derive(Debug, Default)]
struct ScannedEntry {
    /// Hash of the content the loader last returned.
    current: Option<ContentHash>,
    /// Every cached version: the loader's plus any context overrides.
    versions: FxHashMap<ContentHash, Arc<ScannedDocument>>,
    /// Contexts that substitute each version for the URL.
    holders: FxHashMap<ContentHash, FxHashSet<ContextId>>,
}

impl ScannedEntry {
    /// Drop `hash` unless the loader or a context still uses it.
    fn prune(&mut self, hash: ContentHash) {
        if self.current == Some(hash) {
            return;
        }
        if self.holders.get(&hash).is_none_or(|holders| holders.is_empty()) {
            self.holders.remove(&hash);
            self.versions.remove(&hash);
        }
    }
}

/// `url → (content hash → scanned document)`.
#[derive(Debug, Default)]
pub(crate) struct ScannedCache {
    entries: FxHashMap<DocumentUrl, ScannedEntry>,
}

impl ScannedCache {
    pub(crate) fn get(&self, url: &DocumentUrl, hash: ContentHash) -> Option<Arc<ScannedDocument>> {
        self.entries.get(url)?.versions.get(&hash).cloned()
    }

    /// Hash of the loader version of `url`, if one is cached.
    pub(crate) fn current(&self, url: &DocumentUrl) -> Option<ContentHash> {
        self.entries.get(url)?.current
    }

    /// Whether `context` is recorded as substituting this version.
    pub(crate) fn is_held(&self, url: &DocumentUrl, hash: ContentHash, context: ContextId) -> bool {
        self.entries
            .get(url)
            .and_then(|entry| entry.holders.get(&hash))
            .is_some_and(|holders| holders.contains(&context))
    }

    /// Store `scanned` as the loader version of its URL, evicting the
    /// previous loader version. Returns `true` when the loader version
    /// changed.
    pub(crate) fn insert_loader(&mut self, scanned: Arc<ScannedDocument>) -> bool {
        let hash = scanned.content_hash;
        let entry = self.entries.entry(scanned.url.clone()).or_default();
        entry.versions.insert(hash, scanned);
        if entry.current == Some(hash) {
            return false;
        }
        if let Some(previous) = entry.current.replace(hash) {
            entry.prune(previous);
        }
        true
    }

    /// Store `scanned` as the content `context` substitutes for its URL.
    pub(crate) fn insert_override(&mut self, scanned: Arc<ScannedDocument>, context: ContextId) {
        let hash = scanned.content_hash;
        let entry = self.entries.entry(scanned.url.clone()).or_default();
        entry.versions.insert(hash, scanned);
        entry.holders.entry(hash).or_default().insert(context);
    }

    /// Forget the loader version of `url`. Versions a context holds stay.
    pub(crate) fn evict_current(&mut self, url: &DocumentUrl) -> bool {
        let Some(entry) = self.entries.get_mut(url) else {
            return false;
        };
        let Some(current) = entry.current.take() else {
            return false;
        };
        entry.prune(current);
        if entry.versions.is_empty() {
            self.entries.remove(url);
        }
        true
    }

    /// Drop `context`'s hold on every version of `url`, and the versions
    /// nothing else uses. Returns whether any version went.
    pub(crate) fn release(&mut self, url: &DocumentUrl, context: ContextId) -> bool {
        let Some(entry) = self.entries.get_mut(url) else {
            return false;
        };
        let before = entry.versions.len();
        let released: Vec<ContentHash> = entry
            .holders
            .iter_mut()
            .filter_map(|(hash, holders)| holders.remove(&context).then_some(*hash))
            .collect();
        for hash in released {
            entry.prune(hash);
        }
        let removed = entry.versions.len() < before;
        if entry.versions.is_empty() {
            self.entries.remove(url);
        }
        removed
    }

    /// Import targets across every cached version of `url`.
    pub(crate) fn import_targets(&self, url: &DocumentUrl) -> FxHashSet<DocumentUrl> {
        self.entries
            .get(url)
            .into_iter()
            .flat_map(|entry| entry.versions.values())
            .flat_map(|scanned| scanned.import_targets())
            .cloned()
            .collect()
    }

    /// Number of cached versions across all URLs.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(|entry| entry.versions.len()).sum()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
