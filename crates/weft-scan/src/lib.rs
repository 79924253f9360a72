//! Parsing and feature scanning for web component sources.
//!
//! A [`ScanPipeline`] takes one file's text and produces a
//! [`ScannedDocument`](weft_core::ScannedDocument): it picks a parser by
//! extension (HTML, JavaScript/TypeScript via oxc, CSS via lightningcss,
//! JSON), runs every [`Scanner`] registered for that content type, scans
//! inline `<script>` and `<style>` bodies of HTML files, and resolves import
//! specifiers. Nothing in this crate performs I/O.
//!
//! ```
//! use std::sync::Arc;
//! use weft_core::{DocumentUrl, FeatureKind, PackageResolver};
//! use weft_scan::ScanPipeline;
//!
//! let url = DocumentUrl::new("x-foo.js").unwrap();
//! let source = "class XFoo extends HTMLElement {}\ncustomElements.define('x-foo', XFoo);";
//! let doc = ScanPipeline::default().scan(&url, Arc::from(source), &PackageResolver::new());
//! assert_eq!(doc.features[0].kind(), FeatureKind::Element);
//! assert!(doc.features[0].has_identifier("x-foo"));
//! ```

pub mod jsdoc;
pub mod parse;
pub mod pipeline;
pub mod scanner;
pub mod scanners;

pub use jsdoc::{JsDoc, JsDocTag, parse_jsdoc};
pub use parse::{RawSyntaxError, SyntaxTree};
pub use pipeline::ScanPipeline;
pub use scanner::{ScanContext, Scanner, ScannerRegistry};
pub use scanners::css::CssImportScanner;
pub use scanners::html::{DomModuleScanner, HtmlImportScanner};
pub use scanners::js::{
    BehaviorScanner, ElementScanner, ExportScanner, JsImportScanner, MixinScanner,
    NamespaceScanner,
};
