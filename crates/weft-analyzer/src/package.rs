//! Package-wide view over every analyzed entry point.

use weft_core::{DocumentUrl, Feature, FeatureKind, Warning};

use crate::document::{Document, DocumentNode, QueryOptions, walk};

/// The result of [`Analyzer::analyze_package`](crate::Analyzer::analyze_package).
///
/// Queries have the same shape as on [`Document`] and cover every entry
/// point, visiting each URL once even when several entry points import it.
/// Every feature keeps its `source_range.file`, so callers can drop test
/// fixtures or vendored code by path.
#[derive(Debug, Clone, Default)]
pub struct PackageDocument {
    documents: Vec<Document>,
    warnings: Vec<Warning>,
}

impl PackageDocument {
    pub(crate) fn new(documents: Vec<Document>, warnings: Vec<Warning>) -> Self {
        Self {
            documents,
            warnings,
        }
    }

    /// One document per entry point, sorted by URL.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, url: &DocumentUrl) -> Option<&Document> {
        self.documents.iter().find(|document| document.url() == url)
    }

    /// Entry point URLs.
    pub fn urls(&self) -> impl Iterator<Item = &DocumentUrl> {
        self.documents.iter().map(Document::url)
    }

    fn nodes(&self, options: QueryOptions) -> Vec<&DocumentNode> {
        walk(&self.documents, options)
    }

    pub fn get_features(&self, options: QueryOptions) -> Vec<&Feature> {
        self.nodes(options)
            .into_iter()
            .flat_map(|node| node.scanned.features.iter())
            .collect()
    }

    pub fn get_by_kind(&self, kind: FeatureKind, options: QueryOptions) -> Vec<&Feature> {
        self.get_features(options)
            .into_iter()
            .filter(|feature| feature.kind() == kind)
            .collect()
    }

    pub fn get_by_id(
        &self,
        kind: FeatureKind,
        identifier: &str,
        options: QueryOptions,
    ) -> Vec<&Feature> {
        self.get_features(options)
            .into_iter()
            .filter(|feature| feature.kind() == kind && feature.has_identifier(identifier))
            .collect()
    }

    /// Entry points that failed to load, then the warnings of every
    /// document the query reaches.
    pub fn get_warnings(&self, options: QueryOptions) -> Vec<&Warning> {
        self.warnings
            .iter()
            .chain(
                self.nodes(options)
                    .into_iter()
                    .flat_map(DocumentNode::local_warnings),
            )
            .collect()
    }

    pub fn reachable_urls(&self, options: QueryOptions) -> Vec<&DocumentUrl> {
        self.nodes(options).into_iter().map(|node| &node.url).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
