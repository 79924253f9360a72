//! The two-level analysis cache.
//!
//! - scanned documents, keyed by URL and content hash, valid until the
//!   loader returns different content for the URL;
//! - resolved documents, keyed by URL and resolution context, valid until
//!   the URL or anything it transitively imports changes.
//!
//! The cache also owns the [`DependencyGraph`]. Edges follow the scanned
//! versions a URL has cached, and a changed loader version invalidates the
//! resolved level for the URL and everything that imports it.
//!
//! Contexts other than the default one are kept in least-recently-used
//! order. Forgetting a context drops its resolved documents and the
//! override versions no other context holds.

mod resolved;
mod scanned;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::debug;
use weft_core::{ContentHash, DocumentUrl, ScannedDocument};

use crate::context::ContextId;
use crate::document::{Document, DocumentId, DocumentNode};
use crate::graph::DependencyGraph;

use resolved::ResolvedCache;
use scanned::ScannedCache;

/// Cache key of a resolved document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub url: DocumentUrl,
    pub context: ContextId,
}

impl DocumentKey {
    pub fn new(url: DocumentUrl, context: ContextId) -> Self {
        Self { url, context }
    }
}

/// Counters and sizes, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Loads whose content hash matched a cached scan.
    pub scanned_hits: u64,
    /// Parse-and-scan runs.
    pub scanned_misses: u64,
    /// Requests answered from the resolved level.
    pub resolved_hits: u64,
    /// Requests that had to resolve.
    pub resolved_misses: u64,
    /// Resolved documents dropped by invalidation.
    pub invalidated: u64,
    /// Contexts forgotten, explicitly or to stay within the context limit.
    pub contexts_evicted: u64,
    /// Scanned versions currently cached.
    pub scanned_documents: usize,
    /// Resolved documents currently cached.
    pub resolved_documents: usize,
    /// Contexts with cached scans or resolved documents.
    pub live_contexts: usize,
}

#[derive(Debug, Default)]
struct Counters {
    scanned_hits: AtomicU64,
    scanned_misses: AtomicU64,
    resolved_hits: AtomicU64,
    resolved_misses: AtomicU64,
    invalidated: AtomicU64,
    contexts_evicted: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

/// Where the content of a scanned document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    /// Read from the loader while the URL was at this generation.
    Loader(u64),
    /// Substituted by this resolution context.
    Override(ContextId),
}

/// Bookkeeping for one context with cached data.
#[derive(Debug, Default)]
struct LiveContext {
    /// URLs whose scanned versions this context holds.
    overridden: FxHashSet<DocumentUrl>,
    /// Clock value of the last use.
    last_used: AtomicU64,
}

#[derive(Debug, Default)]
pub struct AnalysisCache {
    scanned: ScannedCache,
    resolved: ResolvedCache,
    graph: DependencyGraph,
    /// Bumped by every `file_changed`; survives `clear`.
    generations: FxHashMap<DocumentUrl, u64>,
    /// Bumped by every `file_changed` and `clear`.
    epoch: u64,
    contexts: FxHashMap<ContextId, LiveContext>,
    clock: AtomicU64,
    counters: Counters,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cached scan of `url` with exactly this content.
    pub fn scanned(&self, url: &DocumentUrl, hash: ContentHash) -> Option<Arc<ScannedDocument>> {
        let found = self.scanned.get(url, hash);
        if found.is_some() {
            Counters::bump(&self.counters.scanned_hits, 1);
        }
        found
    }

    pub fn current_hash(&self, url: &DocumentUrl) -> Option<ContentHash> {
        self.scanned.current(url)
    }

    /// How many times `url` was reported changed.
    pub fn generation(&self, url: &DocumentUrl) -> u64 {
        self.generations.get(url).copied().unwrap_or(0)
    }

    /// Changes seen so far. Work started under an older epoch may be
    /// based on content that is gone.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether `source` is recorded as using this version of `url`.
    pub fn holds(&self, url: &DocumentUrl, hash: ContentHash, source: ScanSource) -> bool {
        match source {
            ScanSource::Loader(_) => self.scanned.current(url) == Some(hash),
            ScanSource::Override(context) => self.scanned.is_held(url, hash, context),
        }
    }

    /// Record a fresh scan and rebuild the URL's graph edges.
    ///
    /// Loader content read before the URL's latest change is not stored;
    /// returns whether the scan was kept.
    pub fn store_scanned(&mut self, scanned: Arc<ScannedDocument>, source: ScanSource) -> bool {
        Counters::bump(&self.counters.scanned_misses, 1);
        self.adopt_scanned(scanned, source)
    }

    /// Record that `source` uses `scanned`, a version that was scanned
    /// before (possibly for another source).
    ///
    /// A loader version replaces the URL's previous one and invalidates
    /// its dependents, exactly like a fresh scan would.
    pub fn adopt_scanned(&mut self, scanned: Arc<ScannedDocument>, source: ScanSource) -> bool {
        let url = scanned.url.clone();
        let changed = match source {
            ScanSource::Loader(generation) if generation != self.generation(&url) => {
                debug!(url = %url, "Dropped scan of superseded content");
                return false;
            }
            ScanSource::Loader(_) => self.scanned.insert_loader(scanned),
            ScanSource::Override(context) => {
                self.live_context(context).overridden.insert(url.clone());
                self.scanned.insert_override(scanned, context);
                false
            }
        };
        let targets = self.scanned.import_targets(&url);
        self.graph.set_edges(&url, targets);
        if changed {
            self.invalidate(&url);
        }
        true
    }

    /// The loader content of `url` is stale: drop its resolved dependents
    /// and its scanned loader version.
    pub fn file_changed(&mut self, url: &DocumentUrl) {
        self.epoch += 1;
        *self.generations.entry(url.clone()).or_default() += 1;
        self.invalidate(url);
        if self.scanned.evict_current(url) {
            let targets = self.scanned.import_targets(url);
            self.graph.set_edges(url, targets);
        }
    }

    /// Invalidate the resolved documents of `url` and of everything that
    /// transitively imports it.
    pub fn invalidate(&mut self, url: &DocumentUrl) -> usize {
        let affected = self.graph.transitive_dependents([url]);
        let removed = self.resolved.invalidate(&affected, url);
        if removed > 0 {
            Counters::bump(&self.counters.invalidated, removed as u64);
            debug!(
                url = %url,
                affected = affected.len(),
                removed,
                "Invalidated resolved documents"
            );
        }
        removed
    }

    pub fn resolved_id(&self, url: &DocumentUrl, context: ContextId) -> Option<DocumentId> {
        self.resolved.lookup(url, context)
    }

    pub fn is_resolved(&self, url: &DocumentUrl, context: ContextId) -> bool {
        self.resolved_id(url, context).is_some()
    }

    /// A memoized document view, without building one.
    pub fn memoized(&self, key: &DocumentKey) -> Option<Document> {
        let id = self.resolved.lookup(&key.url, key.context)?;
        self.resolved.memoized(id)
    }

    /// The document view for `key`, building it if the node is cached but
    /// no view was requested yet.
    pub fn document(&mut self, key: &DocumentKey) -> Option<Document> {
        let id = self.resolved.lookup(&key.url, key.context)?;
        self.resolved.view(id)
    }

    pub(crate) fn reserve_id(&mut self) -> DocumentId {
        self.resolved.reserve()
    }

    pub(crate) fn insert_node(&mut self, node: DocumentNode) {
        self.live_context(node.context.id());
        self.resolved.insert(node);
    }

    fn live_context(&mut self, context: ContextId) -> &mut LiveContext {
        let now = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        let live = self.contexts.entry(context).or_default();
        *live.last_used.get_mut() = now;
        live
    }

    /// Mark `context` as just used. Works under a shared lock.
    pub(crate) fn touch_context(&self, context: ContextId) {
        if let Some(live) = self.contexts.get(&context) {
            let now = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
            live.last_used.store(now, Ordering::Relaxed);
        }
    }

    /// Drop everything cached for `context`: its resolved documents, and
    /// the override versions no other context holds. Returns how many
    /// resolved documents went.
    pub fn forget_context(&mut self, context: ContextId) -> usize {
        if let Some(live) = self.contexts.remove(&context) {
            for url in &live.overridden {
                if self.scanned.release(url, context) {
                    let targets = self.scanned.import_targets(url);
                    self.graph.set_edges(url, targets);
                }
            }
            Counters::bump(&self.counters.contexts_evicted, 1);
        }
        let removed = self.resolved.remove_context(context);
        debug!(context = %context, removed, "Forgot context");
        removed
    }

    /// Forget the least recently used contexts until at most `max` are
    /// left besides the `pinned` ones, which are never forgotten.
    pub fn evict_contexts(&mut self, max: usize, pinned: &[ContextId]) -> usize {
        let mut candidates: Vec<(u64, ContextId)> = self
            .contexts
            .iter()
            .filter(|(id, _)| !pinned.contains(*id))
            .map(|(id, live)| (live.last_used.load(Ordering::Relaxed), *id))
            .collect();
        let excess = candidates.len().saturating_sub(max);
        if excess == 0 {
            return 0;
        }
        candidates.sort_unstable_by_key(|(last_used, _)| *last_used);
        for (_, context) in candidates.iter().take(excess) {
            self.forget_context(*context);
        }
        excess
    }

    pub(crate) fn record_resolved_hit(&self) {
        Counters::bump(&self.counters.resolved_hits, 1);
    }

    pub(crate) fn record_resolved_miss(&self) {
        Counters::bump(&self.counters.resolved_misses, 1);
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn stats(&self) -> CacheStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        CacheStats {
            scanned_hits: load(&self.counters.scanned_hits),
            scanned_misses: load(&self.counters.scanned_misses),
            resolved_hits: load(&self.counters.resolved_hits),
            resolved_misses: load(&self.counters.resolved_misses),
            invalidated: load(&self.counters.invalidated),
            contexts_evicted: load(&self.counters.contexts_evicted),
            scanned_documents: self.scanned.len(),
            resolved_documents: self.resolved.len(),
            live_contexts: self.contexts.len(),
        }
    }

    /// Drop every cached document and edge. Counters keep running.
    pub fn clear(&mut self) {
        self.epoch += 1;
        self.contexts.clear();
        self.scanned.clear();
        self.resolved.clear();
        self.graph.clear();
    }
}
