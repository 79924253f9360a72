//! The scanner contract and registry.
//!
//! A [`Scanner`] walks one parsed tree and reports [`Feature`]s and
//! [`Warning`]s into a [`ScanContext`]. Scanners are pure: no I/O, no
//! failure. Anything a scanner does not understand it skips.
//!
//! Scanners are registered explicitly in a [`ScannerRegistry`] and selected
//! by [`ContentType`]; several scanners may run over the same tree and their
//! results are concatenated.

use weft_core::{ContentType, DocumentUrl, Feature, LineIndex, SourceRange, Warning};

use crate::parse::SyntaxTree;
use crate::scanners;

pub trait Scanner: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The content type this scanner understands.
    fn content_type(&self) -> ContentType;

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>);
}

/// Collects the output of the scanners running over one parsed text.
///
/// Scanners report byte offsets relative to the text they were given; the
/// context shifts them by `base_offset` (non-zero for inline scripts and
/// styles) and converts them into positions in the containing file.
#[derive(Debug)]
pub struct ScanContext<'s> {
    url: &'s DocumentUrl,
    lines: &'s LineIndex<'s>,
    base_offset: u32,
    features: Vec<Feature>,
    warnings: Vec<Warning>,
}

impl<'s> ScanContext<'s> {
    pub fn new(url: &'s DocumentUrl, lines: &'s LineIndex<'s>, base_offset: u32) -> Self {
        Self {
            url,
            lines,
            base_offset,
            features: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn url(&self) -> &DocumentUrl {
        self.url
    }

    /// Range in the containing file for a span of the scanned text.
    pub fn source_range(&self, start: u32, end: u32) -> SourceRange {
        SourceRange::new(
            self.url.clone(),
            self.lines.position(self.base_offset + start),
            self.lines.position(self.base_offset + end),
        )
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Vec<Feature>, Vec<Warning>) {
        (self.features, self.warnings)
    }
}

/// An ordered, explicit list of scanners.
#[derive(Debug)]
pub struct ScannerRegistry {
    scanners: Vec<Box<dyn Scanner>>,
}

impl ScannerRegistry {
    /// A registry with no scanners at all.
    pub fn empty() -> Self {
        Self {
            scanners: Vec::new(),
        }
    }

    /// Append a scanner. Scanners run in registration order.
    pub fn with_scanner(mut self, scanner: impl Scanner + 'static) -> Self {
        self.scanners.push(Box::new(scanner));
        self
    }

    pub fn for_content_type(&self, content_type: ContentType) -> impl Iterator<Item = &dyn Scanner> {
        self.scanners
            .iter()
            .map(|scanner| scanner.as_ref())
            .filter(move |scanner| scanner.content_type() == content_type)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.scanners.iter().map(|scanner| scanner.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

impl Default for ScannerRegistry {
    /// The built-in scanners for HTML, JavaScript and CSS.
    fn default() -> Self {
        Self::empty()
            .with_scanner(scanners::html::HtmlImportScanner)
            .with_scanner(scanners::html::DomModuleScanner)
            .with_scanner(scanners::js::JsImportScanner)
            .with_scanner(scanners::js::ElementScanner)
            .with_scanner(scanners::js::MixinScanner)
            .with_scanner(scanners::js::BehaviorScanner)
            .with_scanner(scanners::js::NamespaceScanner)
            .with_scanner(scanners::js::ExportScanner)
            .with_scanner(scanners::css::CssImportScanner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::Position;

    #[test]
    fn default_registry_selects_by_content_type() {
        let registry = ScannerRegistry::default();
        let html: Vec<_> = registry
            .for_content_type(ContentType::Html)
            .map(|s| s.name())
            .collect();
        assert_eq!(html, ["html-import", "dom-module"]);
        assert_eq!(registry.for_content_type(ContentType::Json).count(), 0);
        assert_eq!(registry.for_content_type(ContentType::Css).count(), 1);
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn context_shifts_by_base_offset() {
        let url = DocumentUrl::new("index.html").unwrap();
        let source = "<script>\nclass A {}\n</script>";
        let lines = LineIndex::new(source);
        let ctx = ScanContext::new(&url, &lines, 8);
        // offset 1 in the script body is the `c` of `class`
        let range = ctx.source_range(1, 11);
        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(1, 10));
        assert_eq!(range.file, url);
    }
}
