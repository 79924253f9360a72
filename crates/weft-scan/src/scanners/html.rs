use serde_json::json;
use weft_core::{ContentType, Feature, FeatureData, GenericData, ImportKind, ImportSyntax};

use super::import_feature;
use crate::parse::{HtmlElement, SyntaxTree};
use crate::scanner::{ScanContext, Scanner};

/// `<link rel="import">`, `<link rel="lazy-import">`, `<link rel="stylesheet">`
/// and `<script src>` references.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlImportScanner;

impl Scanner for HtmlImportScanner {
    fn name(&self) -> &'static str {
        "html-import"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Html
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Html(document) = tree else {
            return;
        };

        for element in &document.elements {
            let Some((href, kind, syntax)) = classify(element) else {
                continue;
            };
            let range = ctx.source_range(element.span.start, element.span.end);
            ctx.add_feature(import_feature(range, href, kind, syntax));
        }
    }
}

fn classify(element: &HtmlElement) -> Option<(&str, ImportKind, ImportSyntax)> {
    match element.tag.as_str() {
        "link" => {
            let href = element.attr("href").filter(|href| !href.trim().is_empty())?;
            let rel = element.rel_tokens();
            if rel.iter().any(|token| token == "import") {
                Some((href.trim(), ImportKind::Eager, ImportSyntax::HtmlImport))
            } else if rel.iter().any(|token| token == "lazy-import") {
                Some((href.trim(), ImportKind::Lazy, ImportSyntax::HtmlImport))
            } else if rel.iter().any(|token| token == "stylesheet") {
                Some((href.trim(), ImportKind::Eager, ImportSyntax::HtmlStyle))
            } else {
                None
            }
        }
        "script" => {
            let src = element.attr("src").filter(|src| !src.trim().is_empty())?;
            Some((src.trim(), ImportKind::Eager, ImportSyntax::HtmlScript))
        }
        _ => None,
    }
}

/// `<dom-module id="...">` templates, reported as generic features.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomModuleScanner;

impl Scanner for DomModuleScanner {
    fn name(&self) -> &'static str {
        "dom-module"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Html
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Html(document) = tree else {
            return;
        };

        for element in document.elements_named("dom-module") {
            let Some(id) = element.attr("id").map(str::trim).filter(|id| !id.is_empty()) else {
                continue;
            };
            let range = ctx.source_range(element.span.start, element.span.end);
            let feature = Feature::new(
                range,
                FeatureData::Generic(GenericData {
                    name: "dom-module".to_string(),
                    data: json!({ "id": id }),
                }),
            )
            .with_identifiers([id]);
            ctx.add_feature(feature);
        }
    }
}
