//! Shared data model for the weft analyzer.
//!
//! This crate holds the types every other weft crate speaks:
//!
//! - [`DocumentUrl`], [`SourceRange`] and [`LineIndex`] for addressing text
//! - [`Feature`] / [`FeatureData`], the closed set of extracted facts
//! - [`Warning`], the only way recoverable problems are reported
//! - [`ScannedDocument`], the context-free result of analyzing one file
//! - the [`Loader`] and [`Resolver`] collaborator contracts, with
//!   filesystem, in-memory and package implementations

pub mod document;
pub mod feature;
pub mod loader;
pub mod resolver;
pub mod span;
pub mod url;
pub mod warning;

pub use document::{ContentHash, ContentType, ScannedDocument, SyntaxError};
pub use feature::{
    BehaviorData, ElementData, Feature, FeatureData, FeatureKind, GenericData, ImportFeature,
    ImportKind, ImportSyntax, MixinData, NamespaceData, PropertyDescriptor,
};
pub use loader::{FsLoader, InMemoryLoader, LoadError, LoadResult, Loader, MAX_FILE_SIZE};
pub use resolver::{PackageResolver, Resolver};
pub use span::{LineIndex, Position, SourceRange};
pub use url::{DocumentUrl, UrlError};
pub use warning::{Severity, Warning, WarningCode};
