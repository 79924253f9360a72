use oxc_ast::ast::{
    AssignmentExpression, Declaration, Expression, Statement, VariableDeclaration, VariableDeclarator,
};
use oxc_ast_visit::{Visit, walk};
use oxc_span::{GetSpan, Span};
use rustc_hash::FxHashMap;
use weft_core::{BehaviorData, ContentType, Feature, FeatureData, NamespaceData};

use super::support::{
    DocScope, JsDocIndex, array_paths, binding_name, object_get, object_properties, target_path,
    unparen,
};
use crate::parse::SyntaxTree;
use crate::scanner::{ScanContext, Scanner};

/// Legacy Polymer behaviors: object literals (or arrays of behaviors)
/// documented `@polymerBehavior` or named `*Behavior`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorScanner;

impl Scanner for BehaviorScanner {
    fn name(&self) -> &'static str {
        "behavior"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Js
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Js(program) = tree else {
            return;
        };
        BehaviorVisitor {
            ctx,
            docs: DocScope::new(program),
        }
        .visit_program(program);
    }
}

struct BehaviorVisitor<'c, 's> {
    ctx: &'c mut ScanContext<'s>,
    docs: DocScope,
}

impl BehaviorVisitor<'_, '_> {
    fn candidate(&mut self, name: Option<String>, value: &Expression<'_>, span: Span) {
        let Some(name) = name else {
            return;
        };
        let value = unparen(value);
        if !matches!(
            value,
            Expression::ObjectExpression(_) | Expression::ArrayExpression(_)
        ) {
            return;
        }

        let doc = self.docs.lookup(span.start);
        let tag = doc.as_ref().and_then(|doc| doc.tag("polymerBehavior"));
        if tag.is_none() && !name.ends_with("Behavior") {
            return;
        }
        let behavior_name = tag
            .and_then(|tag| tag.first_word())
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());

        let (properties, behaviors) = match value {
            Expression::ObjectExpression(object) => {
                let properties = match object_get(object, "properties").map(unparen) {
                    Some(Expression::ObjectExpression(properties)) => {
                        object_properties(properties, self.ctx)
                    }
                    _ => Vec::new(),
                };
                let behaviors = object_get(object, "behaviors")
                    .map(array_paths)
                    .unwrap_or_default();
                (properties, behaviors)
            }
            // A composite behavior: `[A, B, Impl]`.
            _ => (Vec::new(), array_paths(value)),
        };

        let range = self.ctx.source_range(span.start, span.end);
        let data = BehaviorData {
            name: behavior_name.clone(),
            behaviors,
            properties,
            description: doc.and_then(|doc| doc.description),
        };
        let feature =
            Feature::new(range, FeatureData::Behavior(data)).with_identifiers([behavior_name, name]);
        self.ctx.add_feature(feature);
    }
}

impl<'a> Visit<'a> for BehaviorVisitor<'_, '_> {
    fn visit_statement(&mut self, statement: &Statement<'a>) {
        self.docs.enter(statement);
        walk::walk_statement(self, statement);
        self.docs.leave();
    }

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'a>) {
        if let Some(init) = &declarator.init {
            self.candidate(binding_name(&declarator.id), init, declarator.span);
        }
        walk::walk_variable_declarator(self, declarator);
    }

    fn visit_assignment_expression(&mut self, assignment: &AssignmentExpression<'a>) {
        self.candidate(
            target_path(&assignment.left),
            &assignment.right,
            assignment.span,
        );
        walk::walk_assignment_expression(self, assignment);
    }
}

/// Namespaces declared with a `@namespace` JSDoc tag.
///
/// The name comes from the tag (`@namespace Polymer.Foo`) or, when the tag
/// is bare, from the variable or assignment the comment documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceScanner;

impl Scanner for NamespaceScanner {
    fn name(&self) -> &'static str {
        "namespace"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Js
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Js(program) = tree else {
            return;
        };

        let index = JsDocIndex::new(program);
        let mut documented: Vec<_> = index
            .iter()
            .filter(|(_, doc)| doc.has_tag("namespace"))
            .collect();
        if documented.is_empty() {
            return;
        }
        documented.sort_by_key(|(start, _)| *start);

        let mut statements = NamedStatements::default();
        statements.visit_program(program);

        for (start, doc) in documented {
            let declared = statements.names.get(&start);
            let explicit = doc
                .tag("namespace")
                .and_then(|tag| tag.first_word())
                .map(str::to_string);
            let Some(name) = explicit.or_else(|| declared.map(|(name, _)| name.clone())) else {
                continue;
            };
            let end = declared.map_or(start, |(_, end)| *end);

            let range = ctx.source_range(start, end);
            let data = NamespaceData {
                name: name.clone(),
                description: doc.description.clone(),
            };
            ctx.add_feature(Feature::new(range, FeatureData::Namespace(data)).with_identifiers([name]));
        }
    }
}

/// Name and end offset of each declaring statement, by start offset.
#[derive(Debug, Default)]
struct NamedStatements {
    names: FxHashMap<u32, (String, u32)>,
}

impl NamedStatements {
    fn first_binding(declaration: &VariableDeclaration<'_>) -> Option<String> {
        declaration
            .declarations
            .first()
            .and_then(|declarator| binding_name(&declarator.id))
    }
}

impl<'a> Visit<'a> for NamedStatements {
    fn visit_statement(&mut self, statement: &Statement<'a>) {
        let name = match statement {
            Statement::VariableDeclaration(declaration) => Self::first_binding(declaration),
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::VariableDeclaration(declaration)) => Self::first_binding(declaration),
                _ => None,
            },
            Statement::ExpressionStatement(statement) => match unparen(&statement.expression) {
                Expression::AssignmentExpression(assignment) => target_path(&assignment.left),
                _ => None,
            },
            _ => None,
        };
        if let Some(name) = name {
            let span = statement.span();
            self.names.insert(span.start, (name, span.end));
        }
        walk::walk_statement(self, statement);
    }
}
