//! URL-level import graph.
//!
//! The graph only knows which URL imports which. It is rebuilt one URL at a
//! time from scanned documents and drives cache invalidation: when a file
//! changes, everything that transitively imports it is stale.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use weft_core::DocumentUrl;

/// Forward ("imports") and reverse ("imported by") adjacency over URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: FxHashMap<DocumentUrl, FxHashSet<DocumentUrl>>,
    dependents: FxHashMap<DocumentUrl, FxHashSet<DocumentUrl>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every outgoing edge of `url`.
    ///
    /// Edges from a previous call are removed from both directions first, so
    /// nothing stale survives a rescan.
    pub fn set_edges<I>(&mut self, url: &DocumentUrl, targets: I)
    where
        I: IntoIterator<Item = DocumentUrl>,
    {
        if let Some(previous) = self.dependencies.remove(url) {
            for target in previous {
                if let Some(importers) = self.dependents.get_mut(&target) {
                    importers.remove(url);
                    if importers.is_empty() {
                        self.dependents.remove(&target);
                    }
                }
            }
        }

        let targets: FxHashSet<DocumentUrl> = targets.into_iter().collect();
        if targets.is_empty() {
            return;
        }
        for target in &targets {
            self.dependents
                .entry(target.clone())
                .or_default()
                .insert(url.clone());
        }
        self.dependencies.insert(url.clone(), targets);
    }

    /// URLs `url` imports directly.
    pub fn dependencies(&self, url: &DocumentUrl) -> impl Iterator<Item = &DocumentUrl> {
        self.dependencies.get(url).into_iter().flatten()
    }

    /// URLs that import `url` directly.
    pub fn dependents(&self, url: &DocumentUrl) -> impl Iterator<Item = &DocumentUrl> {
        self.dependents.get(url).into_iter().flatten()
    }

    /// The seeds plus everything that transitively imports any of them.
    pub fn transitive_dependents<'a, I>(&self, seeds: I) -> FxHashSet<DocumentUrl>
    where
        I: IntoIterator<Item = &'a DocumentUrl>,
    {
        let mut reached = FxHashSet::default();
        let mut queue: Vec<&DocumentUrl> = seeds.into_iter().collect();
        while let Some(url) = queue.pop() {
            if !reached.insert(url.clone()) {
                continue;
            }
            queue.extend(self.dependents(url));
        }
        reached
    }

    /// Everything reachable from `url` through one or more imports.
    ///
    /// `url` itself is included only when it sits on a cycle.
    pub fn transitive_dependencies(&self, url: &DocumentUrl) -> FxHashSet<DocumentUrl> {
        let mut reached = FxHashSet::default();
        let mut queue: Vec<&DocumentUrl> = self.dependencies(url).collect();
        while let Some(next) = queue.pop() {
            if !reached.insert(next.clone()) {
                continue;
            }
            queue.extend(self.dependencies(next));
        }
        reached
    }

    /// Import cycles, as strongly connected components.
    ///
    /// Self-imports count. Each cycle is sorted, and cycles are ordered by
    /// their first URL.
    pub fn cycles(&self) -> Vec<Vec<DocumentUrl>> {
        let mut graph: DiGraph<&DocumentUrl, ()> = DiGraph::new();
        let mut indices: FxHashMap<&DocumentUrl, NodeIndex> = FxHashMap::default();
        for url in self.urls() {
            indices.insert(url, graph.add_node(url));
        }
        for (from, targets) in &self.dependencies {
            for to in targets {
                if let (Some(&a), Some(&b)) = (indices.get(from), indices.get(to)) {
                    graph.add_edge(a, b, ());
                }
            }
        }

        let mut cycles: Vec<Vec<DocumentUrl>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| {
                let mut urls: Vec<DocumentUrl> =
                    component.into_iter().map(|index| graph[index].clone()).collect();
                urls.sort();
                urls
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Whether `url` has any edge in either direction.
    pub fn contains(&self, url: &DocumentUrl) -> bool {
        self.dependencies.contains_key(url) || self.dependents.contains_key(url)
    }

    /// Every URL with at least one edge.
    pub fn urls(&self) -> impl Iterator<Item = &DocumentUrl> {
        self.dependencies.keys().chain(
            self.dependents
                .keys()
                .filter(|url| !self.dependencies.contains_key(*url)),
        )
    }

    pub fn len(&self) -> usize {
        self.urls().count()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(FxHashSet::len).sum()
    }

    pub fn clear(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }
}
