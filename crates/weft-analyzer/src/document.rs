//! Resolved documents and the query API over them.
//!
//! Resolved documents live in an arena owned by the analysis cache. A
//! [`DocumentNode`] refers to its imports by [`DocumentId`], so import cycles
//! are plain id cycles. A [`Document`] is a cheap view: its root node plus a
//! shared snapshot of every node reachable from it.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use weft_core::{
    DocumentUrl, Feature, FeatureKind, ImportKind, ScannedDocument, SourceRange, Warning,
};

use crate::context::{ContextId, ResolutionContext};

/// Arena handle of a resolved document. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub(crate) u64);

impl DocumentId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved import of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    pub target: DocumentId,
    pub url: DocumentUrl,
    /// Eager when any import of `url` in the source is eager.
    pub kind: ImportKind,
    /// Where the first import of `url` is written.
    pub source_range: SourceRange,
}

/// One document resolved in one context.
#[derive(Debug)]
pub struct DocumentNode {
    pub id: DocumentId,
    pub url: DocumentUrl,
    pub context: Arc<ResolutionContext>,
    pub scanned: Arc<ScannedDocument>,
    /// Distinct import targets, in source order.
    pub imports: Vec<ImportEdge>,
    /// Problems found while linking: unresolvable specifiers and imports
    /// that could not be loaded.
    pub warnings: Vec<Warning>,
    /// Whether the document lives inside a component directory.
    pub is_external: bool,
}

impl DocumentNode {
    /// Add an edge, merging repeated imports of the same target.
    pub(crate) fn push_import(&mut self, edge: ImportEdge) {
        match self.imports.iter_mut().find(|existing| existing.target == edge.target) {
            Some(existing) => {
                if edge.kind == ImportKind::Eager {
                    existing.kind = ImportKind::Eager;
                }
            }
            None => self.imports.push(edge),
        }
    }

    /// Warnings from scanning and linking this document alone.
    pub fn local_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.scanned
            .warnings
            .iter()
            .chain(self.scanned.features.iter().flat_map(|f| f.warnings.iter()))
            .chain(self.warnings.iter())
    }
}

/// Controls how far a query walks the import graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Include features of imported documents, not just the root's own.
    pub imported: bool,
    /// Descend into documents that live in component directories.
    pub external_packages: bool,
    /// Follow lazy imports (`import()`, `<link rel="lazy-import">`).
    pub lazy_imports: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            imported: true,
            external_packages: false,
            lazy_imports: false,
        }
    }
}

impl QueryOptions {
    /// Only the document's own features.
    pub fn local() -> Self {
        Self {
            imported: false,
            ..Self::default()
        }
    }

    /// Everything reachable, including external and lazily imported documents.
    pub fn everything() -> Self {
        Self {
            imported: true,
            external_packages: true,
            lazy_imports: true,
        }
    }

    pub fn with_imported(mut self, imported: bool) -> Self {
        self.imported = imported;
        self
    }

    pub fn with_external_packages(mut self, external_packages: bool) -> Self {
        self.external_packages = external_packages;
        self
    }

    pub fn with_lazy_imports(mut self, lazy_imports: bool) -> Self {
        self.lazy_imports = lazy_imports;
        self
    }
}

/// A resolved document: a scanned document bound into a resolution context.
///
/// Cloning is cheap, and the snapshot is immutable: a document obtained
/// before a file changed keeps answering queries about the old content.
#[derive(Clone)]
pub struct Document {
    root: Arc<DocumentNode>,
    nodes: Arc<FxHashMap<DocumentId, Arc<DocumentNode>>>,
}

impl Document {
    /// `nodes` must contain everything reachable from `root`.
    pub(crate) fn new(
        root: Arc<DocumentNode>,
        nodes: Arc<FxHashMap<DocumentId, Arc<DocumentNode>>>,
    ) -> Self {
        Self { root, nodes }
    }

    fn node_for(&self, id: DocumentId) -> Option<&DocumentNode> {
        self.nodes.get(&id).map(|node| &**node)
    }

    pub fn node(&self) -> &DocumentNode {
        &self.root
    }

    pub fn id(&self) -> DocumentId {
        self.root.id
    }

    pub fn url(&self) -> &DocumentUrl {
        &self.root.url
    }

    pub fn scanned(&self) -> &Arc<ScannedDocument> {
        &self.root.scanned
    }

    pub fn context_id(&self) -> ContextId {
        self.root.context.id()
    }

    pub fn is_external(&self) -> bool {
        self.root.is_external
    }

    /// Whether two handles share the same snapshot.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.root, &other.root) && Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    /// Documents this one imports directly, lazy ones included.
    pub fn direct_imports(&self) -> Vec<Document> {
        self.root
            .imports
            .iter()
            .filter_map(|edge| self.nodes.get(&edge.target))
            .map(|node| Document {
                root: Arc::clone(node),
                nodes: Arc::clone(&self.nodes),
            })
            .collect()
    }

    /// Features of every document the query reaches, grouped by document
    /// and in source order within each.
    pub fn get_features(&self, options: QueryOptions) -> Vec<&Feature> {
        walk([self], options)
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

    /// Features of `kind` that can be looked up by `identifier`.
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

    /// Scan, feature and link warnings of every document the query reaches.
    pub fn get_warnings(&self, options: QueryOptions) -> Vec<&Warning> {
        walk([self], options)
            .into_iter()
            .flat_map(DocumentNode::local_warnings)
            .collect()
    }

    /// URLs the query reaches, root first.
    pub fn reachable_urls(&self, options: QueryOptions) -> Vec<&DocumentUrl> {
        walk([self], options).into_iter().map(|node| &node.url).collect()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.root.id)
            .field("url", &self.root.url)
            .field("snapshot", &self.nodes.len())
            .finish()
    }
}

/// Depth-first pre-order walk over one or more documents, visiting each URL
/// once.
///
/// Roots are always visited. Lazy edges are skipped unless requested, and
/// external documents are pruned unless requested.
pub(crate) fn walk<'d, I>(roots: I, options: QueryOptions) -> Vec<&'d DocumentNode>
where
    I: IntoIterator<Item = &'d Document>,
{
    let mut seen: FxHashSet<&DocumentUrl> = FxHashSet::default();
    let mut order = Vec::new();

    for document in roots {
        let mut stack = vec![document.root.id];
        while let Some(id) = stack.pop() {
            let Some(node) = document.node_for(id) else {
                continue;
            };
            if !seen.insert(&node.url) {
                continue;
            }
            order.push(node);
            if !options.imported {
                continue;
            }

            // Reversed so the first import is visited first.
            for edge in node.imports.iter().rev() {
                if edge.kind == ImportKind::Lazy && !options.lazy_imports {
                    continue;
                }
                let Some(target) = document.node_for(edge.target) else {
                    continue;
                };
                if target.is_external && !options.external_packages {
                    continue;
                }
                stack.push(edge.target);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{
        ContentHash, ContentType, ElementData, FeatureData, Position, Severity, WarningCode,
    };

    fn url(raw: &str) -> DocumentUrl {
        DocumentUrl::new(raw).unwrap()
    }

    fn element(file: &str, tag: &str) -> Feature {
        let range = SourceRange::new(url(file), Position::new(0, 0), Position::new(0, 1));
        let data = ElementData {
            tag_name: Some(tag.to_string()),
            ..ElementData::default()
        };
        Feature::new(range, FeatureData::Element(data)).with_identifiers([tag])
    }

    struct Builder {
        nodes: FxHashMap<DocumentId, Arc<DocumentNode>>,
    }

    impl Builder {
        fn new() -> Self {
            Self {
                nodes: FxHashMap::default(),
            }
        }

        fn node(mut self, id: u64, file: &str, imports: &[(u64, &str, ImportKind)]) -> Self {
            let tag = format!("x-{}", file.trim_end_matches(".js").replace('/', "-"));
            let scanned = ScannedDocument {
                url: url(file),
                content: Arc::from(""),
                content_hash: ContentHash::of(file),
                content_type: Some(ContentType::Js),
                parse_errors: Vec::new(),
                features: vec![element(file, &tag)],
                warnings: Vec::new(),
            };
            let mut node = DocumentNode {
                id: DocumentId(id),
                url: url(file),
                context: Arc::new(ResolutionContext::default()),
                scanned: Arc::new(scanned),
                imports: Vec::new(),
                warnings: Vec::new(),
                is_external: file.starts_with("node_modules/"),
            };
            for (target, target_file, kind) in imports {
                node.push_import(ImportEdge {
                    target: DocumentId(*target),
                    url: url(target_file),
                    kind: *kind,
                    source_range: SourceRange::file_start(url(file)),
                });
            }
            self.nodes.insert(DocumentId(id), Arc::new(node));
            self
        }

        fn document(self, root: u64) -> Document {
            let root = Arc::clone(&self.nodes[&DocumentId(root)]);
            Document::new(root, Arc::new(self.nodes))
        }
    }

    fn tags(features: Vec<&Feature>) -> Vec<&str> {
        features
            .into_iter()
            .map(|feature| feature.identifiers[0].as_str())
            .collect()
    }

    use ImportKind::{Eager, Lazy};

    #[test]
    fn diamonds_are_visited_once_in_pre_order() {
        let document = Builder::new()
            .node(1, "a.js", &[(2, "b.js", Eager), (3, "c.js", Eager)])
            .node(2, "b.js", &[(4, "d.js", Eager)])
            .node(3, "c.js", &[(4, "d.js", Eager)])
            .node(4, "d.js", &[])
            .document(1);

        let urls: Vec<_> = document
            .reachable_urls(QueryOptions::default())
            .into_iter()
            .map(DocumentUrl::as_str)
            .collect();
        assert_eq!(urls, ["a.js", "b.js", "d.js", "c.js"]);
        assert_eq!(
            tags(document.get_by_kind(FeatureKind::Element, QueryOptions::default())),
            ["x-a", "x-b", "x-d", "x-c"]
        );
        assert_eq!(
            document.get_by_id(FeatureKind::Element, "x-d", QueryOptions::default()).len(),
            1
        );
    }

    #[test]
    fn cycles_terminate() {
        let document = Builder::new()
            .node(1, "a.js", &[(2, "b.js", Eager)])
            .node(2, "b.js", &[(1, "a.js", Eager)])
            .document(1);
        assert_eq!(
            tags(document.get_features(QueryOptions::default())),
            ["x-a", "x-b"]
        );

        let b = &document.direct_imports()[0];
        assert_eq!(b.url().as_str(), "b.js");
        assert_eq!(tags(b.get_features(QueryOptions::default())), ["x-b", "x-a"]);
    }

    #[test]
    fn lazy_and_external_edges_are_opt_in() {
        let document = Builder::new()
            .node(1, "app.js", &[(2, "lazy.js", Lazy), (3, "node_modules/lit/index.js", Eager)])
            .node(2, "lazy.js", &[])
            .node(3, "node_modules/lit/index.js", &[])
            .document(1);

        assert_eq!(tags(document.get_features(QueryOptions::default())), ["x-app"]);
        assert_eq!(
            tags(document.get_features(QueryOptions::default().with_lazy_imports(true))),
            ["x-app", "x-lazy"]
        );
        assert_eq!(
            document
                .get_features(QueryOptions::default().with_external_packages(true))
                .len(),
            2
        );
        assert_eq!(document.get_features(QueryOptions::everything()).len(), 3);
        assert_eq!(document.get_features(QueryOptions::local()).len(), 1);
    }

    #[test]
    fn external_roots_still_report_their_own_features() {
        let document = Builder::new()
            .node(1, "node_modules/lit/index.js", &[])
            .document(1);
        assert!(document.is_external());
        assert_eq!(document.get_features(QueryOptions::default()).len(), 1);
    }

    #[test]
    fn repeated_imports_merge_and_eager_wins() {
        let document = Builder::new()
            .node(1, "a.js", &[(2, "b.js", Lazy), (2, "b.js", Eager)])
            .node(2, "b.js", &[])
            .document(1);
        assert_eq!(document.node().imports.len(), 1);
        assert_eq!(document.node().imports[0].kind, Eager);
    }

    #[test]
    fn warnings_cover_scan_feature_and_link_problems() {
        let mut builder = Builder::new().node(2, "b.js", &[]);
        let mut node = DocumentNode {
            id: DocumentId(1),
            url: url("a.js"),
            context: Arc::new(ResolutionContext::default()),
            scanned: Arc::clone(&builder.nodes[&DocumentId(2)].scanned),
            imports: Vec::new(),
            warnings: vec![Warning::warning(
                WarningCode::CouldNotResolve,
                "could not resolve import `lit`",
                SourceRange::file_start(url("a.js")),
            )],
            is_external: false,
        };
        node.push_import(ImportEdge {
            target: DocumentId(2),
            url: url("b.js"),
            kind: Eager,
            source_range: SourceRange::file_start(url("a.js")),
        });
        builder.nodes.insert(DocumentId(1), Arc::new(node));
        let document = builder.document(1);

        let warnings = document.get_warnings(QueryOptions::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert_eq!(warnings[0].code, WarningCode::CouldNotResolve);
    }
}
