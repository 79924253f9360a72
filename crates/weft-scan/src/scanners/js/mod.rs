//! JavaScript scanners.
//!
//! Every scanner walks the oxc AST independently; shared AST helpers live in
//! `support`.

mod behavior;
mod element;
mod mixin;
mod support;

use oxc_ast::ast::{
    Declaration, ExportAllDeclaration, ExportDefaultDeclarationKind, ExportNamedDeclaration,
    ImportDeclaration, ImportExpression, Statement,
};
use oxc_ast_visit::{Visit, walk};
use serde_json::json;
use weft_core::{
    ContentType, Feature, FeatureData, GenericData, ImportKind, ImportSyntax, Warning, WarningCode,
};

pub use behavior::{BehaviorScanner, NamespaceScanner};
pub use element::ElementScanner;
pub use mixin::MixinScanner;

use super::import_feature;
use crate::parse::SyntaxTree;
use crate::scanner::{ScanContext, Scanner};
use support::{binding_name, string_value};

/// Static imports, re-exports and dynamic `import()` calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsImportScanner;

impl Scanner for JsImportScanner {
    fn name(&self) -> &'static str {
        "js-import"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Js
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Js(program) = tree else {
            return;
        };
        ImportVisitor { ctx }.visit_program(program);
    }
}

struct ImportVisitor<'c, 's> {
    ctx: &'c mut ScanContext<'s>,
}

impl ImportVisitor<'_, '_> {
    fn push(&mut self, start: u32, end: u32, specifier: &str, kind: ImportKind, syntax: ImportSyntax) {
        let range = self.ctx.source_range(start, end);
        self.ctx.add_feature(import_feature(range, specifier, kind, syntax));
    }
}

impl<'a> Visit<'a> for ImportVisitor<'_, '_> {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if !decl.import_kind.is_type() {
            self.push(
                decl.span.start,
                decl.span.end,
                &decl.source.value,
                ImportKind::Eager,
                ImportSyntax::JsImport,
            );
        }
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = decl.source.as_ref().filter(|_| !decl.export_kind.is_type()) {
            self.push(
                decl.span.start,
                decl.span.end,
                &source.value,
                ImportKind::Eager,
                ImportSyntax::JsExport,
            );
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.push(
                decl.span.start,
                decl.span.end,
                &decl.source.value,
                ImportKind::Eager,
                ImportSyntax::JsExport,
            );
        }
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        match string_value(&expr.source) {
            Some(specifier) => self.push(
                expr.span.start,
                expr.span.end,
                &specifier,
                ImportKind::Lazy,
                ImportSyntax::JsDynamicImport,
            ),
            None => {
                let range = self.ctx.source_range(expr.span.start, expr.span.end);
                self.ctx.add_warning(Warning::info(
                    WarningCode::UnsupportedDynamicImport,
                    "dynamic import with a computed specifier cannot be followed",
                    range,
                ));
            }
        }
        walk::walk_import_expression(self, expr);
    }
}

/// Names exported by each top-level `export` statement, reported as
/// `js-export` generic features.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportScanner;

impl Scanner for ExportScanner {
    fn name(&self) -> &'static str {
        "js-export"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Js
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Js(program) = tree else {
            return;
        };

        for statement in &program.body {
            let (names, span) = match statement {
                Statement::ExportNamedDeclaration(export) if !export.export_kind.is_type() => {
                    (named_exports(export), export.span)
                }
                Statement::ExportDefaultDeclaration(export) => {
                    let mut names = vec!["default".to_string()];
                    let local = match &export.declaration {
                        ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                            class.id.as_ref().map(|id| id.name.to_string())
                        }
                        ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                            function.id.as_ref().map(|id| id.name.to_string())
                        }
                        _ => None,
                    };
                    names.extend(local);
                    (names, export.span)
                }
                Statement::ExportAllDeclaration(export) if !export.export_kind.is_type() => {
                    let name = export
                        .exported
                        .as_ref()
                        .map(|name| name.name().to_string())
                        .unwrap_or_else(|| "*".to_string());
                    (vec![name], export.span)
                }
                _ => continue,
            };
            if names.is_empty() {
                continue;
            }

            let range = ctx.source_range(span.start, span.end);
            let feature = Feature::new(
                range,
                FeatureData::Generic(GenericData {
                    name: "js-export".to_string(),
                    data: json!({ "names": names }),
                }),
            )
            .with_identifiers(names);
            ctx.add_feature(feature);
        }
    }
}

fn named_exports(export: &ExportNamedDeclaration<'_>) -> Vec<String> {
    match &export.declaration {
        Some(Declaration::VariableDeclaration(variable)) => variable
            .declarations
            .iter()
            .filter_map(|declarator| binding_name(&declarator.id))
            .collect(),
        Some(Declaration::FunctionDeclaration(function)) => {
            function.id.iter().map(|id| id.name.to_string()).collect()
        }
        Some(Declaration::ClassDeclaration(class)) => {
            class.id.iter().map(|id| id.name.to_string()).collect()
        }
        Some(_) => Vec::new(),
        None => export
            .specifiers
            .iter()
            .map(|specifier| specifier.exported.name().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_js;
    use oxc_allocator::Allocator;
    use oxc_span::SourceType;
    use weft_core::{DocumentUrl, LineIndex, Position};

    fn scan(scanner: &dyn Scanner, source: &str) -> (Vec<Feature>, Vec<Warning>) {
        let allocator = Allocator::default();
        let parsed = parse_js(&allocator, source, SourceType::mjs());
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let url = DocumentUrl::new("src/x-app.js").unwrap();
        let lines = LineIndex::new(source);
        let mut ctx = ScanContext::new(&url, &lines, 0);
        scanner.scan(&SyntaxTree::Js(&parsed.program), &mut ctx);
        ctx.into_parts()
    }

    #[test]
    fn finds_static_and_dynamic_imports() {
        let source = "import {a} from './a.js';\n\
                      import './side-effect.js';\n\
                      export {b} from '../b.js';\n\
                      export * from '@polymer/polymer/polymer-element.js';\n\
                      export const local = 1;\n\
                      async function go() { await import('./lazy.js'); await import(name); }";
        let (features, warnings) = scan(&JsImportScanner, source);

        let imports: Vec<_> = features
            .iter()
            .map(|f| {
                let import = f.as_import().unwrap();
                (import.specifier.as_str(), import.import_kind, import.syntax)
            })
            .collect();
        assert_eq!(
            imports,
            [
                ("./a.js", ImportKind::Eager, ImportSyntax::JsImport),
                ("./side-effect.js", ImportKind::Eager, ImportSyntax::JsImport),
                ("../b.js", ImportKind::Eager, ImportSyntax::JsExport),
                (
                    "@polymer/polymer/polymer-element.js",
                    ImportKind::Eager,
                    ImportSyntax::JsExport
                ),
                ("./lazy.js", ImportKind::Lazy, ImportSyntax::JsDynamicImport),
            ]
        );
        assert_eq!(features[1].source_range.start, Position::new(1, 0));

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::UnsupportedDynamicImport);
    }

    #[test]
    fn reports_exported_names_per_statement() {
        let source = "export const a = 1, b = 2;\n\
                      export class C {}\n\
                      export { a as d };\n\
                      export default function main() {}\n\
                      export * as ns from './ns.js';\n\
                      const hidden = 3;";
        let (features, _) = scan(&ExportScanner, source);
        let names: Vec<Vec<String>> = features.iter().map(|f| f.identifiers.clone()).collect();
        assert_eq!(
            names,
            [
                vec!["a".to_string(), "b".to_string()],
                vec!["C".to_string()],
                vec!["d".to_string()],
                vec!["default".to_string(), "main".to_string()],
                vec!["ns".to_string()],
            ]
        );
        let FeatureData::Generic(generic) = &features[0].data else {
            panic!("expected a generic feature");
        };
        assert_eq!(generic.name, "js-export");
        assert_eq!(generic.data["names"], json!(["a", "b"]));
    }
}
