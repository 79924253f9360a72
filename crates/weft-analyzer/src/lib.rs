//! Incremental, cycle-safe analysis of web component packages.
//!
//! The [`Analyzer`] turns files into [`Document`]s: it loads each file
//! through a [`Loader`](weft_core::Loader), scans it with a
//! [`ScanPipeline`](weft_scan::ScanPipeline), follows its imports, and links
//! the results into an arena of resolved documents that may import each
//! other in cycles. Results are cached at two levels: scanned documents by
//! content hash, resolved documents by resolution context. After
//! [`Analyzer::files_changed`] only the changed files and their transitive
//! importers are recomputed.
//!
//! ```
//! use weft_analyzer::{Analyzer, QueryOptions};
//! use weft_core::{FeatureKind, InMemoryLoader};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> weft_analyzer::Result<()> {
//! let loader = InMemoryLoader::from_files([
//!     ("x.js", "class XFoo extends HTMLElement {}\ncustomElements.define('x-foo', XFoo);"),
//!     ("y.js", "import './x.js';"),
//! ])?;
//! let analyzer = Analyzer::builder().loader(loader).build();
//!
//! let document = analyzer.analyze("y.js").await?;
//! let elements = document.get_by_kind(FeatureKind::Element, QueryOptions::default());
//! assert_eq!(elements.len(), 1);
//! assert!(elements[0].has_identifier("x-foo"));
//! assert_eq!(elements[0].source_range.file.as_str(), "x.js");
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod graph;
pub mod package;

#[cfg(test)]
mod tests;

pub use analyzer::{Analyzer, AnalyzerBuilder, Configured, Unconfigured};
pub use cache::{CacheStats, DocumentKey};
pub use config::AnalyzerConfig;
pub use context::{ContextId, ResolutionContext};
pub use document::{Document, DocumentId, DocumentNode, ImportEdge, QueryOptions};
pub use error::{AnalysisError, Result};
pub use graph::DependencyGraph;
pub use package::PackageDocument;
