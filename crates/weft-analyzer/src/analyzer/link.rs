//! Link phase: turning discovered scans into arena nodes.
//!
//! Runs under the cache write lock, so it never waits on I/O. Every URL in
//! the batch gets an id before any node is built; an import that leads back
//! into the batch (a cycle) is simply an edge to a reserved id, and the
//! nodes are inserted together once all of them are complete.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;
use weft_core::{
    DocumentUrl, Feature, ImportFeature, LoadError, ScannedDocument, SourceRange, Warning,
    WarningCode,
};

use crate::cache::{AnalysisCache, DocumentKey, ScanSource};
use crate::config::AnalyzerConfig;
use crate::context::ResolutionContext;
use crate::document::{Document, DocumentId, DocumentNode, ImportEdge};

pub(super) type Discovered = FxHashMap<DocumentUrl, Result<Arc<ScannedDocument>, LoadError>>;

pub(super) enum LinkOutcome {
    Linked(Document),
    /// The cache moved on since discovery; discover again.
    Stale,
}

pub(super) struct Linker<'a> {
    pub root: &'a DocumentUrl,
    pub context: &'a Arc<ResolutionContext>,
    pub discovered: &'a Discovered,
    pub config: &'a AnalyzerConfig,
    /// Link whatever is there instead of reporting staleness.
    pub final_attempt: bool,
}

impl Linker<'_> {
    pub(super) fn link(&self, cache: &mut AnalysisCache) -> LinkOutcome {
        let context_id = self.context.id();
        let key = DocumentKey::new(self.root.clone(), context_id);
        if let Some(document) = cache.document(&key) {
            return LinkOutcome::Linked(document);
        }

        // Everything reachable from the root that is not resolved yet.
        let mut reserved: FxHashMap<DocumentUrl, DocumentId> = FxHashMap::default();
        let mut batch: Vec<(DocumentUrl, Arc<ScannedDocument>)> = Vec::new();
        // Scans that lost a race with a change; only linked on the final attempt.
        let mut superseded: FxHashSet<DocumentUrl> = FxHashSet::default();
        let mut stack = vec![self.root.clone()];
        while let Some(url) = stack.pop() {
            if reserved.contains_key(&url) || cache.is_resolved(&url, context_id) {
                continue;
            }
            let Some(Ok(scanned)) = self.discovered.get(&url) else {
                continue;
            };
            if !self.is_current(cache, &url, scanned) {
                if !self.final_attempt {
                    return LinkOutcome::Stale;
                }
                superseded.insert(url.clone());
            }
            reserved.insert(url.clone(), cache.reserve_id());
            stack.extend(scanned.import_targets().cloned());
            batch.push((url, Arc::clone(scanned)));
        }

        let mut nodes = Vec::with_capacity(batch.len());
        for (url, scanned) in batch {
            let Some(&id) = reserved.get(&url) else {
                continue;
            };
            let mut node = DocumentNode {
                id,
                is_external: self.config.is_external(&url),
                url,
                context: Arc::clone(self.context),
                scanned: Arc::clone(&scanned),
                imports: Vec::new(),
                warnings: Vec::new(),
            };
            if superseded.contains(&node.url) {
                node.warnings.push(Warning::warning(
                    WarningCode::CouldNotLoad,
                    format!("`{}` changed during analysis", node.url),
                    SourceRange::file_start(node.url.clone()),
                ));
            }
            for (feature, import) in scanned.imports() {
                if !self.link_import(cache, &reserved, &mut node, feature, import) {
                    return LinkOutcome::Stale;
                }
            }
            nodes.push(node);
        }

        let count = nodes.len();
        for node in nodes {
            // The context may have been forgotten while this request ran.
            if self.context.overrides(&node.url) {
                cache.adopt_scanned(Arc::clone(&node.scanned), ScanSource::Override(context_id));
            }
            cache.insert_node(node);
        }
        trace!(root = %self.root, context = %context_id, nodes = count, "Linked documents");

        let document = cache.document(&key);
        // The caller gets its snapshot, but later requests must not.
        for url in &superseded {
            cache.invalidate(url);
        }
        match document {
            Some(document) => LinkOutcome::Linked(document),
            None => LinkOutcome::Stale,
        }
    }

    /// Record one import on `node`. Returns `false` when the target is
    /// neither resolved nor part of this batch.
    fn link_import(
        &self,
        cache: &AnalysisCache,
        reserved: &FxHashMap<DocumentUrl, DocumentId>,
        node: &mut DocumentNode,
        feature: &Feature,
        import: &ImportFeature,
    ) -> bool {
        let Some(target) = &import.resolved_url else {
            node.warnings.push(Warning::warning(
                WarningCode::CouldNotResolve,
                format!("could not resolve import `{}`", import.specifier),
                feature.source_range.clone(),
            ));
            return true;
        };

        let target_id = cache
            .resolved_id(target, self.context.id())
            .or_else(|| reserved.get(target).copied());
        if let Some(target_id) = target_id {
            trace!(from = %node.url, to = %target, "Import edge");
            node.push_import(ImportEdge {
                target: target_id,
                url: target.clone(),
                kind: import.import_kind,
                source_range: feature.source_range.clone(),
            });
            return true;
        }

        let message = match self.discovered.get(target) {
            Some(Err(error)) => format!("could not load `{target}`: {error}"),
            _ if self.final_attempt => format!("`{target}` changed during analysis"),
            _ => return false,
        };
        node.warnings.push(Warning::warning(
            WarningCode::CouldNotLoad,
            message,
            feature.source_range.clone(),
        ));
        true
    }

    /// Whether the scan discovery used is still the one the cache holds.
    fn is_current(
        &self,
        cache: &AnalysisCache,
        url: &DocumentUrl,
        scanned: &ScannedDocument,
    ) -> bool {
        self.context.overrides(url) || cache.current_hash(url) == Some(scanned.content_hash)
    }
}
