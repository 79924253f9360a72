//! Turning one file's text into a [`ScannedDocument`].

use std::sync::Arc;

use oxc_allocator::Allocator;
use oxc_span::SourceType;
use tracing::debug;
use weft_core::{
    ContentHash, ContentType, DocumentUrl, Feature, FeatureData, LineIndex, Resolver,
    ScannedDocument, SourceRange, SyntaxError, Warning, WarningCode,
};

use crate::parse::{
    HtmlDocument, RawSyntaxError, SyntaxTree, TextSpan, js::source_type_for, parse_css, parse_html,
    parse_js, parse_json,
};
use crate::scanner::{ScanContext, ScannerRegistry};

/// Parses a file and runs every registered scanner for its content type.
///
/// Scanning never fails: unknown file types, syntax errors and scanner
/// complaints all end up as warnings on the returned document.
#[derive(Debug, Clone, Default)]
pub struct ScanPipeline {
    registry: Arc<ScannerRegistry>,
}

impl ScanPipeline {
    pub fn new(registry: ScannerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ScannerRegistry {
        &self.registry
    }

    pub fn scan(
        &self,
        url: &DocumentUrl,
        content: Arc<str>,
        resolver: &dyn Resolver,
    ) -> ScannedDocument {
        let text: &str = &content;
        let lines = LineIndex::new(text);
        let content_type = ContentType::from_url(url);
        let content_hash = ContentHash::of(text);

        let mut output = ScanOutput::default();
        match content_type {
            None => output.warnings.push(Warning::info(
                WarningCode::UnknownFileType,
                format!("no parser for `{}`", url.file_name()),
                SourceRange::file_start(url.clone()),
            )),
            Some(ContentType::Html) => match parse_html(text) {
                Ok(document) => {
                    let tree = SyntaxTree::Html(&document);
                    self.run(ContentType::Html, &tree, url, &lines, 0, &mut output);
                    self.scan_inline(&document, text, url, &lines, &mut output);
                }
                Err(error) => output.fail(url, &lines, vec![error]),
            },
            Some(ContentType::Js) => {
                let allocator = Allocator::default();
                let parsed = parse_js(&allocator, text, source_type_for(url.file_name()));
                if parsed.errors.is_empty() {
                    let tree = SyntaxTree::Js(&parsed.program);
                    self.run(ContentType::Js, &tree, url, &lines, 0, &mut output);
                } else {
                    output.fail(url, &lines, parsed.errors);
                }
            }
            Some(ContentType::Css) => match parse_css(text, url.as_str()) {
                Ok(sheet) => {
                    let tree = SyntaxTree::Css { sheet: &sheet, source: text };
                    self.run(ContentType::Css, &tree, url, &lines, 0, &mut output);
                }
                Err(error) => output.fail(url, &lines, vec![error]),
            },
            Some(ContentType::Json) => match parse_json(text) {
                Ok(value) => {
                    let tree = SyntaxTree::Json(&value);
                    self.run(ContentType::Json, &tree, url, &lines, 0, &mut output);
                }
                Err(error) => output.fail(url, &lines, vec![error]),
            },
        }

        let ScanOutput {
            mut features,
            warnings,
            parse_errors,
        } = output;

        features.sort_by_key(|feature| feature.source_range.start);
        for feature in &mut features {
            if let FeatureData::Import(import) = &mut feature.data {
                import.resolved_url = resolver.resolve(&import.specifier, url, import.syntax);
            }
        }

        debug!(
            url = %url,
            features = features.len(),
            warnings = warnings.len(),
            parse_errors = parse_errors.len(),
            "Scanned document"
        );

        ScannedDocument {
            url: url.clone(),
            content_hash,
            content,
            content_type,
            parse_errors,
            features,
            warnings,
        }
    }

    fn run(
        &self,
        content_type: ContentType,
        tree: &SyntaxTree<'_, '_>,
        url: &DocumentUrl,
        lines: &LineIndex<'_>,
        base_offset: u32,
        output: &mut ScanOutput,
    ) {
        let mut ctx = ScanContext::new(url, lines, base_offset);
        for scanner in self.registry.for_content_type(content_type) {
            scanner.scan(tree, &mut ctx);
        }
        let (features, warnings) = ctx.into_parts();
        output.features.extend(features);
        output.warnings.extend(warnings);
    }

    /// Inline `<script>` and `<style>` bodies of an HTML document.
    ///
    /// Syntax errors here only produce warnings; the document itself parsed.
    fn scan_inline(
        &self,
        document: &HtmlDocument,
        text: &str,
        url: &DocumentUrl,
        lines: &LineIndex<'_>,
        output: &mut ScanOutput,
    ) {
        for element in &document.elements {
            let Some(TextSpan { start, end }) = element.raw_text else {
                continue;
            };
            let Some(body) = text.get(start as usize..end as usize) else {
                continue;
            };
            if body.trim().is_empty() {
                continue;
            }

            match element.tag.as_str() {
                "script" if !element.has_attr("src") => {
                    let Some(source_type) = inline_script_type(element.attr("type")) else {
                        continue;
                    };
                    let allocator = Allocator::default();
                    let parsed = parse_js(&allocator, body, source_type);
                    match parsed.errors.first() {
                        None => {
                            let tree = SyntaxTree::Js(&parsed.program);
                            self.run(ContentType::Js, &tree, url, lines, start, output);
                        }
                        Some(error) => output.inline_error(url, lines, start, error),
                    }
                }
                "style" => match parse_css(body, url.as_str()) {
                    Ok(sheet) => {
                        let tree = SyntaxTree::Css { sheet: &sheet, source: body };
                        self.run(ContentType::Css, &tree, url, lines, start, output);
                    }
                    Err(error) => output.inline_error(url, lines, start, &error),
                },
                _ => {}
            }
        }
    }
}

/// Source type for an inline script, `None` when the body is not JavaScript
/// (templates, JSON blobs and so on).
fn inline_script_type(type_attr: Option<&str>) -> Option<SourceType> {
    let kind = type_attr.map(|kind| kind.trim().to_ascii_lowercase()).unwrap_or_default();
    match kind.as_str() {
        "module" => Some(SourceType::mjs()),
        "" | "text/javascript" | "application/javascript" | "text/ecmascript"
        | "application/ecmascript" => Some(SourceType::cjs()),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct ScanOutput {
    features: Vec<Feature>,
    warnings: Vec<Warning>,
    parse_errors: Vec<SyntaxError>,
}

impl ScanOutput {
    /// Record a failed top-level parse. Features found before the failure,
    /// if any, are discarded.
    fn fail(&mut self, url: &DocumentUrl, lines: &LineIndex<'_>, errors: Vec<RawSyntaxError>) {
        self.features.clear();
        self.parse_errors = errors
            .into_iter()
            .map(|error| {
                let position = lines.position(error.offset);
                SyntaxError {
                    message: error.message,
                    source_range: SourceRange::new(url.clone(), position, position),
                }
            })
            .collect();
        if let Some(first) = self.parse_errors.first() {
            self.warnings.push(Warning::error(
                WarningCode::ParseError,
                first.message.clone(),
                first.source_range.clone(),
            ));
        }
    }

    fn inline_error(
        &mut self,
        url: &DocumentUrl,
        lines: &LineIndex<'_>,
        base_offset: u32,
        error: &RawSyntaxError,
    ) {
        let position = lines.position(base_offset + error.offset);
        self.warnings.push(Warning::error(
            WarningCode::ParseError,
            error.message.clone(),
            SourceRange::new(url.clone(), position, position),
        ));
    }
}
