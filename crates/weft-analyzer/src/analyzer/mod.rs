//! The analyzer: the one entry point for analysis requests.
//!
//! An [`Analyzer`] owns its cache, dependency graph and in-flight request
//! maps. Nothing is process-wide, so independent analyzers (one per project
//! in an editor, say) never share state.

mod link;
mod resolve;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};
use weft_core::{
    ContentHash, ContentType, DocumentUrl, Loader, PackageResolver, Resolver, ScannedDocument,
    SourceRange, Warning, WarningCode,
};
use weft_scan::ScanPipeline;

use crate::cache::{AnalysisCache, CacheStats, DocumentKey};
use crate::config::AnalyzerConfig;
use crate::context::ResolutionContext;
use crate::document::Document;
use crate::error::{AnalysisError, Result};
use crate::graph::DependencyGraph;
use crate::package::PackageDocument;

/// Typestate marker for a builder without a loader yet.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured;

/// Typestate marker for a builder with a loader.
#[derive(Debug, Clone)]
pub struct Configured {
    loader: Arc<dyn Loader>,
}

/// Builder for [`Analyzer`].
///
/// Uses the typestate pattern: `build()` only exists once a loader has
/// been supplied, so an analyzer that cannot read anything is never built.
///
/// ```rust,no_run
/// use weft_analyzer::{Analyzer, AnalyzerConfig, QueryOptions};
/// use weft_core::{FeatureKind, FsLoader};
///
/// # async fn example() -> weft_analyzer::Result<()> {
/// let analyzer = Analyzer::builder()
///     .loader(FsLoader::new("."))  // Transitions to Configured
///     .config(AnalyzerConfig::default().with_concurrency(8))
///     .build();  // Only available on Configured
///
/// let document = analyzer.analyze("src/my-app.js").await?;
/// let elements = document.get_by_kind(FeatureKind::Element, QueryOptions::default());
/// println!("{} elements", elements.len());
/// # Ok(())
/// # }
/// ```
pub struct AnalyzerBuilder<State = Unconfigured> {
    state: State,
    resolver: Option<Arc<dyn Resolver>>,
    pipeline: ScanPipeline,
    config: AnalyzerConfig,
}

impl AnalyzerBuilder<Unconfigured> {
    /// Create a builder with the default pipeline and configuration.
    ///
    /// A loader must be set before the analyzer can be built.
    pub fn new() -> Self {
        Self {
            state: Unconfigured,
            resolver: None,
            pipeline: ScanPipeline::default(),
            config: AnalyzerConfig::default(),
        }
    }

    /// Set the loader. This transitions the builder to `Configured`.
    pub fn loader(self, loader: impl Loader + 'static) -> AnalyzerBuilder<Configured> {
        self.shared_loader(Arc::new(loader))
    }

    /// Set a loader the caller keeps a handle to (an in-memory loader it
    /// edits, for instance).
    pub fn shared_loader(self, loader: Arc<dyn Loader>) -> AnalyzerBuilder<Configured> {
        AnalyzerBuilder {
            state: Configured { loader },
            resolver: self.resolver,
            pipeline: self.pipeline,
            config: self.config,
        }
    }
}

impl Default for AnalyzerBuilder<Unconfigured> {
    fn default() -> Self {
        Self::new()
    }
}

impl<State> AnalyzerBuilder<State> {
    /// Set the import resolver.
    ///
    /// Defaults to a [`PackageResolver`] mapping bare specifiers into the
    /// first configured component directory.
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Replace the scan pipeline, e.g. to register custom scanners.
    pub fn pipeline(mut self, pipeline: ScanPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set the analyzer configuration.
    ///
    /// Available in both states. When no resolver is set, the default one
    /// is derived from this configuration at `build()` time.
    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }
}

impl AnalyzerBuilder<Configured> {
    /// Build the analyzer.
    ///
    /// Only available once a loader is set. The analyzer starts with empty
    /// caches.
    pub fn build(self) -> Analyzer {
        let resolver = self.resolver.unwrap_or_else(|| {
            let resolver = match self.config.component_dirs.first() {
                Some(dir) => PackageResolver::new().with_component_dir(dir.as_str()),
                None => PackageResolver::new(),
            };
            Arc::new(resolver)
        });

        Analyzer {
            inner: Arc::new(AnalyzerInner {
                loader: self.state.loader,
                resolver,
                pipeline: self.pipeline,
                config: self.config,
                default_context: Arc::new(ResolutionContext::default()),
                cache: RwLock::new(AnalysisCache::new()),
                in_flight: DashMap::default(),
                scans: DashMap::default(),
            }),
        }
    }
}

type ResolutionCell = Arc<OnceCell<Result<Document>>>;
type ScanCell = Arc<OnceCell<Arc<ScannedDocument>>>;

pub(crate) struct AnalyzerInner {
    loader: Arc<dyn Loader>,
    resolver: Arc<dyn Resolver>,
    pipeline: ScanPipeline,
    config: AnalyzerConfig,
    default_context: Arc<ResolutionContext>,
    cache: RwLock<AnalysisCache>,
    /// Resolutions in progress, shared by every request for the same key
    /// made under the same cache epoch.
    in_flight: DashMap<(DocumentKey, u64), ResolutionCell>,
    /// Parse-and-scan runs in progress, by URL and content.
    scans: DashMap<(DocumentUrl, ContentHash), ScanCell>,
}

/// Incremental analyzer for one package.
///
/// Cheap to clone; clones share the cache, so one analyzer can serve
/// concurrent tasks.
#[derive(Clone)]
pub struct Analyzer {
    inner: Arc<AnalyzerInner>,
}

impl Analyzer {
    /// Start building an analyzer. See [`AnalyzerBuilder`].
    pub fn builder() -> AnalyzerBuilder<Unconfigured> {
        AnalyzerBuilder::new()
    }

    /// The configuration this analyzer was built with.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.inner.config
    }

    /// Analyze one document.
    ///
    /// Fails only when `url` is invalid or cannot be loaded. Problems inside
    /// the document or its imports are warnings on the result.
    pub async fn analyze(&self, url: &str) -> Result<Document> {
        let url = DocumentUrl::new(url)?;
        self.analyze_url(&url).await
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn analyze_url(&self, url: &DocumentUrl) -> Result<Document> {
        self.inner
            .resolve(url.clone(), Arc::clone(&self.inner.default_context))
            .await
    }

    /// Analyze one document with some URLs' content substituted.
    ///
    /// Results are cached per context, and a context only shares scans with
    /// others where the content is the same.
    pub async fn analyze_in_context(
        &self,
        url: &str,
        context: ResolutionContext,
    ) -> Result<Document> {
        let url = DocumentUrl::new(url)?;
        let context = if context.is_default() {
            Arc::clone(&self.inner.default_context)
        } else {
            Arc::new(context)
        };
        self.inner.resolve(url, context).await
    }

    /// Analyze every source file of the package.
    ///
    /// Entry points come from [`Loader::list_package_files`], minus files
    /// the analyzer has no parser for and anything under an excluded or
    /// component directory. Entry points that fail to load become warnings.
    #[instrument(skip_all)]
    pub async fn analyze_package(&self) -> Result<PackageDocument> {
        let files = self
            .inner
            .loader
            .list_package_files()
            .await
            .map_err(AnalysisError::Package)?;

        let config = &self.inner.config;
        let mut entries: Vec<DocumentUrl> = files
            .into_iter()
            .filter(|url| ContentType::from_url(url).is_some())
            .filter(|url| !config.is_excluded(url) && !config.is_external(url))
            .collect();
        entries.sort();
        entries.dedup();

        let context = &self.inner.default_context;
        let mut results: Vec<(DocumentUrl, Result<Document>)> = stream::iter(entries)
            .map(move |url| async move {
                let result = self.inner.resolve(url.clone(), Arc::clone(context)).await;
                (url, result)
            })
            .buffer_unordered(config.effective_concurrency())
            .collect()
            .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let mut documents = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        for (url, result) in results {
            match result {
                Ok(document) => documents.push(document),
                Err(error) => warnings.push(load_failure(url, &error)),
            }
        }

        debug!(
            documents = documents.len(),
            failed = warnings.len(),
            "Analyzed package"
        );
        Ok(PackageDocument::new(documents, warnings))
    }

    /// Tell the analyzer that these files changed.
    ///
    /// Drops the cached scan of each URL and every resolved document that
    /// depends on it. Nothing is re-analyzed until the next request.
    pub fn files_changed<I, S>(&self, urls: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .map(DocumentUrl::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut cache = self.inner.cache.write();
        for url in &urls {
            cache.file_changed(url);
        }
        debug!(files = urls.len(), "Files changed");
        Ok(())
    }

    /// Drop everything cached for `context`.
    ///
    /// Its resolved documents go, and so do override scans no other context
    /// holds. Contexts past [`AnalyzerConfig::max_contexts`] are forgotten
    /// automatically; this is for callers that know a context is done with
    /// (a closed editor buffer, say). Forgetting the default context only
    /// drops its resolved documents.
    pub fn forget_context(&self, context: &ResolutionContext) {
        self.inner.cache.write().forget_context(context.id());
    }

    /// Forget every cached scan, resolved document and graph edge.
    pub fn clear_caches(&self) {
        self.inner.cache.write().clear();
        debug!("Cleared analysis caches");
    }

    /// Cache counters and sizes.
    ///
    /// Counters accumulate for the analyzer's lifetime, including across
    /// [`clear_caches`](Self::clear_caches); sizes describe the cache now.
    pub fn stats(&self) -> CacheStats {
        self.inner.cache.read().stats()
    }

    #[cfg(test)]
    pub(crate) fn in_flight_requests(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// A snapshot of the import graph as far as it has been discovered.
    pub fn dependency_graph(&self) -> DependencyGraph {
        self.inner.cache.read().graph().clone()
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("loader", &self.inner.loader)
            .field("resolver", &self.inner.resolver)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

fn load_failure(url: DocumentUrl, error: &AnalysisError) -> Warning {
    let message = match error {
        AnalysisError::Load { source, .. } => format!("failed to load {url}: {source}"),
        other => other.to_string(),
    };
    Warning::error(WarningCode::CouldNotLoad, message, SourceRange::file_start(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{ImportSyntax, InMemoryLoader};

    #[test]
    fn builder_defaults_resolver_to_first_component_dir() {
        let analyzer = Analyzer::builder()
            .config(AnalyzerConfig::default().with_component_dirs(["web_modules"]))
            .loader(InMemoryLoader::new())
            .build();
        let base = DocumentUrl::new("src/app.js").unwrap();
        assert_eq!(
            analyzer
                .inner
                .resolver
                .resolve("lit", &base, ImportSyntax::JsImport)
                .map(String::from)
                .as_deref(),
            Some("web_modules/lit/index.js")
        );
        assert_eq!(analyzer.config().component_dirs, ["web_modules"]);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected_before_loading() {
        let analyzer = Analyzer::builder().loader(InMemoryLoader::new()).build();
        let error = analyzer.analyze("../outside.js").await.unwrap_err();
        assert!(matches!(error, AnalysisError::InvalidUrl(_)));
        assert!(analyzer.files_changed(["https://example.com/x.js"]).is_err());
        assert_eq!(analyzer.stats(), CacheStats::default());
    }
}
