//! Resolution: cache lookup, in-flight de-duplication, discovery and link.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};
use weft_core::{ContentHash, DocumentUrl, LoadError, ScannedDocument};

use super::AnalyzerInner;
use super::link::{Discovered, LinkOutcome, Linker};
use crate::cache::{DocumentKey, ScanSource};
use crate::context::ResolutionContext;
use crate::document::Document;
use crate::error::{AnalysisError, Result};

/// Discovery and link rounds before a request links whatever it has.
const MAX_LINK_ATTEMPTS: usize = 8;

impl AnalyzerInner {
    /// Resolve `url` in `context`, sharing the work with any concurrent
    /// request for the same pair.
    ///
    /// Only requests made under the same cache epoch share: one that starts
    /// after a change never receives a result computed from content read
    /// before it.
    pub(super) async fn resolve(
        &self,
        url: DocumentUrl,
        context: Arc<ResolutionContext>,
    ) -> Result<Document> {
        let key = DocumentKey::new(url, context.id());
        if let Some(document) = self.cached(&key) {
            return Ok(document);
        }

        let flight = (key.clone(), self.cache.read().epoch());
        // The map guard is a temporary and is gone before the first await.
        let cell = Arc::clone(&*self.in_flight.entry(flight.clone()).or_default());
        let result = cell
            .get_or_init(|| self.resolve_uncached(&key, &context))
            .await
            .clone();
        self.in_flight
            .remove_if(&flight, |_, current| Arc::ptr_eq(current, &cell));
        result
    }

    fn cached(&self, key: &DocumentKey) -> Option<Document> {
        {
            let cache = self.cache.read();
            if let Some(document) = cache.memoized(key) {
                cache.record_resolved_hit();
                cache.touch_context(key.context);
                return Some(document);
            }
            if !cache.is_resolved(&key.url, key.context) {
                return None;
            }
        }
        let mut cache = self.cache.write();
        let document = cache.document(key)?;
        cache.record_resolved_hit();
        cache.touch_context(key.context);
        Some(document)
    }

    async fn resolve_uncached(
        &self,
        key: &DocumentKey,
        context: &Arc<ResolutionContext>,
    ) -> Result<Document> {
        // A request that finished between our lookup and taking the cell.
        if let Some(document) = self.cached(key) {
            return Ok(document);
        }
        self.cache.read().record_resolved_miss();

        let mut attempt = 1;
        loop {
            let discovered = self.discover(&key.url, context).await;
            if let Some(Err(error)) = discovered.get(&key.url) {
                return Err(AnalysisError::Load {
                    url: key.url.clone(),
                    source: error.clone(),
                });
            }

            let linker = Linker {
                root: &key.url,
                context,
                discovered: &discovered,
                config: &self.config,
                final_attempt: attempt >= MAX_LINK_ATTEMPTS,
            };
            let outcome = {
                let mut cache = self.cache.write();
                let outcome = linker.link(&mut cache);
                if matches!(outcome, LinkOutcome::Linked(_)) {
                    // Most recent, so it survives any limit of at least one.
                    cache.touch_context(key.context);
                    cache.evict_contexts(
                        self.config.max_contexts.max(1),
                        &[self.default_context.id()],
                    );
                }
                outcome
            };
            match outcome {
                LinkOutcome::Linked(document) => {
                    debug!(
                        url = %key.url,
                        context = %key.context,
                        documents = discovered.len(),
                        attempt,
                        "Resolved document"
                    );
                    return Ok(document);
                }
                LinkOutcome::Stale => {
                    debug!(
                        url = %key.url,
                        attempt,
                        "Dependencies changed during resolution, retrying"
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// Load and scan everything reachable from `root` that is not resolved
    /// in `context` yet, one breadth-first frontier at a time.
    async fn discover(&self, root: &DocumentUrl, context: &ResolutionContext) -> Discovered {
        let mut discovered = Discovered::default();
        let mut seen: FxHashSet<DocumentUrl> = FxHashSet::default();
        seen.insert(root.clone());
        let mut frontier = vec![root.clone()];

        while !frontier.is_empty() {
            let scans: Vec<_> = stream::iter(std::mem::take(&mut frontier))
                .map(move |url| async move {
                    let scanned = self.scan(&url, context).await;
                    (url, scanned)
                })
                .buffer_unordered(self.config.effective_concurrency())
                .collect()
                .await;

            for (url, scanned) in scans {
                if let Ok(scanned) = &scanned {
                    let cache = self.cache.read();
                    for target in scanned.import_targets() {
                        if seen.insert(target.clone()) && !cache.is_resolved(target, context.id()) {
                            trace!(from = %url, to = %target, "Discovered import");
                            frontier.push(target.clone());
                        }
                    }
                }
                discovered.insert(url, scanned);
            }
        }

        discovered
    }

    /// The scanned document for `url` as `context` sees it.
    ///
    /// Content always comes fresh from the loader (or the override); the
    /// parse and scan are skipped when a document with the same content hash
    /// is cached, and shared with any concurrent scan of the same content.
    async fn scan(
        &self,
        url: &DocumentUrl,
        context: &ResolutionContext,
    ) -> std::result::Result<Arc<ScannedDocument>, LoadError> {
        let (content, source): (Arc<str>, ScanSource) = match context.override_for(url) {
            Some(content) => (Arc::clone(content), ScanSource::Override(context.id())),
            None => {
                if !self.loader.can_load(url) {
                    return Err(LoadError::Unsupported(format!("no loader accepts {url}")));
                }
                let generation = self.cache.read().generation(url);
                let content = self.loader.load(url).await?;
                (Arc::from(content), ScanSource::Loader(generation))
            }
        };

        let hash = ContentHash::of(&content);
        let hit = self.cache.read().scanned(url, hash);
        let scanned = match hit {
            Some(scanned) => {
                trace!(url = %url, "Scanned document cache hit");
                scanned
            }
            None => self.scan_uncached(url, content, hash, source).await,
        };

        // The version may have been scanned for another source: an override
        // with the same content as the file, or the other way round.
        if !self.cache.read().holds(url, hash, source) {
            self.cache.write().adopt_scanned(Arc::clone(&scanned), source);
        }
        Ok(scanned)
    }

    async fn scan_uncached(
        &self,
        url: &DocumentUrl,
        content: Arc<str>,
        hash: ContentHash,
        source: ScanSource,
    ) -> Arc<ScannedDocument> {
        let key = (url.clone(), hash);
        let cell = Arc::clone(&*self.scans.entry(key.clone()).or_default());
        let scanned = cell
            .get_or_init(move || async move {
                // A scan of the same content that finished after our lookup.
                if let Some(scanned) = self.cache.read().scanned(url, hash) {
                    return scanned;
                }
                let scanned = Arc::new(self.pipeline.scan(url, content, self.resolver.as_ref()));
                self.cache.write().store_scanned(Arc::clone(&scanned), source);
                scanned
            })
            .await
            .clone();
        self.scans
            .remove_if(&key, |_, current| Arc::ptr_eq(current, &cell));
        scanned
    }
}
