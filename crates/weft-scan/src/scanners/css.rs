use lightningcss::rules::CssRule;
use memchr::memchr;
use weft_core::{ContentType, ImportKind, ImportSyntax, LineIndex};

use super::import_feature;
use crate::parse::SyntaxTree;
use crate::scanner::{ScanContext, Scanner};

/// `@import` rules of a stylesheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssImportScanner;

impl Scanner for CssImportScanner {
    fn name(&self) -> &'static str {
        "css-import"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Css
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Css { sheet, source } = tree else {
            return;
        };
        let lines = LineIndex::new(source);

        for rule in &sheet.rules.0 {
            let CssRule::Import(import) = rule else {
                continue;
            };
            let specifier: &str = &import.url;
            if specifier.trim().is_empty() {
                continue;
            }
            // lightningcss lines are zero-based, columns one-based
            let start = lines.offset(import.loc.line, import.loc.column.saturating_sub(1));
            let end = memchr(b';', &source.as_bytes()[start as usize..])
                .map(|semi| start + semi as u32 + 1)
                .unwrap_or(source.len() as u32);

            let range = ctx.source_range(start, end);
            ctx.add_feature(import_feature(
                range,
                specifier.trim(),
                ImportKind::Eager,
                ImportSyntax::CssImport,
            ));
        }
    }
}
