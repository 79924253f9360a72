//! Resolved-document level of the cache: an arena of [`DocumentNode`]s.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use weft_core::DocumentUrl;

use crate::context::ContextId;
use crate::document::{Document, DocumentId, DocumentNode};

#[derive(Debug, Default)]
pub(crate) struct ResolvedCache {
    next_id: u64,
    nodes: FxHashMap<DocumentId, Arc<DocumentNode>>,
    index: FxHashMap<DocumentUrl, FxHashMap<ContextId, DocumentId>>,
    /// Memoized views, so repeated lookups hand out the same snapshot.
    views: FxHashMap<DocumentId, Document>,
}

impl ResolvedCache {
    pub(crate) fn lookup(&self, url: &DocumentUrl, context: ContextId) -> Option<DocumentId> {
        self.index.get(url)?.get(&context).copied()
    }

    pub(crate) fn memoized(&self, id: DocumentId) -> Option<Document> {
        self.views.get(&id).cloned()
    }

    /// Hand out a fresh id. Ids that end up unused are simply skipped.
    pub(crate) fn reserve(&mut self) -> DocumentId {
        self.next_id += 1;
        DocumentId(self.next_id)
    }

    pub(crate) fn insert(&mut self, node: DocumentNode) {
        self.index
            .entry(node.url.clone())
            .or_default()
            .insert(node.context.id(), node.id);
        self.nodes.insert(node.id, Arc::new(node));
    }

    /// The view rooted at `id`, building and memoizing it on first use.
    pub(crate) fn view(&mut self, id: DocumentId) -> Option<Document> {
        if let Some(view) = self.views.get(&id) {
            return Some(view.clone());
        }
        let root = Arc::clone(self.nodes.get(&id)?);

        let mut reachable: FxHashMap<DocumentId, Arc<DocumentNode>> = FxHashMap::default();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if reachable.contains_key(&next) {
                continue;
            }
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            stack.extend(node.imports.iter().map(|edge| edge.target));
            reachable.insert(next, Arc::clone(node));
        }

        let view = Document::new(root, Arc::new(reachable));
        self.views.insert(id, view.clone());
        Some(view)
    }

    /// Drop every node for `urls`, except nodes whose context overrides
    /// `changed` (their copy of it did not change). Returns how many went.
    pub(crate) fn invalidate(&mut self, urls: &FxHashSet<DocumentUrl>, changed: &DocumentUrl) -> usize {
        let mut removed = 0;
        for url in urls {
            let Some(by_context) = self.index.get_mut(url) else {
                continue;
            };
            let nodes = &mut self.nodes;
            let views = &mut self.views;
            by_context.retain(|_, id| {
                let keep = nodes
                    .get(id)
                    .is_some_and(|node| node.context.overrides(changed));
                if !keep {
                    nodes.remove(id);
                    views.remove(id);
                    removed += 1;
                }
                keep
            });
            if by_context.is_empty() {
                self.index.remove(url);
            }
        }
        removed
    }

    /// Drop every node resolved in `context`. Nodes only link to nodes of
    /// their own context, so nothing else dangles.
    pub(crate) fn remove_context(&mut self, context: ContextId) -> usize {
        let mut removed = 0;
        let nodes = &mut self.nodes;
        let views = &mut self.views;
        self.index.retain(|_, by_context| {
            if let Some(id) = by_context.remove(&context) {
                nodes.remove(&id);
                views.remove(&id);
                removed += 1;
            }
            !by_context.is_empty()
        });
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        // `next_id` keeps counting so old handles never alias new nodes.
        self.nodes.clear();
        self.index.clear();
        self.views.clear();
    }
}
