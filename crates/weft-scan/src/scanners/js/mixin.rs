use oxc_ast::ast::{
    Argument, AssignmentExpression, Class, Declaration, Expression, FormalParameters, Function,
    Statement, VariableDeclarator,
};
use oxc_ast_visit::{Visit, walk};
use oxc_span::Span;
use weft_core::{ContentType, Feature, FeatureData, MixinData};

use super::support::{
    DocScope, arrow_result, binding_name, class_properties, heritage, parameter_names,
    returned_expression, target_path, unparen,
};
use crate::parse::SyntaxTree;
use crate::scanner::{ScanContext, Scanner};

/// Element mixins: functions from a base class to `class extends base`.
///
/// A function counts when it is documented `@mixinFunction`, or when its
/// name ends in `Mixin` and it returns a class extending its parameter.
/// Wrapper calls such as `dedupingMixin(base => ...)` are unwrapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixinScanner;

impl Scanner for MixinScanner {
    fn name(&self) -> &'static str {
        "element-mixin"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Js
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Js(program) = tree else {
            return;
        };
        MixinVisitor {
            ctx,
            docs: DocScope::new(program),
        }
        .visit_program(program);
    }
}

struct MixinVisitor<'c, 's> {
    ctx: &'c mut ScanContext<'s>,
    docs: DocScope,
}

impl MixinVisitor<'_, '_> {
    fn candidate(&mut self, name: Option<String>, body: Option<&Class<'_>>, span: Span) {
        let Some(name) = name else {
            return;
        };
        let doc = self.docs.lookup(span.start);
        let documented = doc.as_ref().is_some_and(|doc| doc.has_tag("mixinFunction"));
        if !documented && !(body.is_some() && name.ends_with("Mixin")) {
            return;
        }

        let mut mixins = body
            .map(|class| heritage(class.super_class.as_ref()).mixins)
            .unwrap_or_default();
        if let Some(doc) = &doc {
            for applied in doc.tags_named("appliesMixin").filter_map(|tag| tag.first_word()) {
                if !mixins.iter().any(|mixin| mixin == applied) {
                    mixins.push(applied.to_string());
                }
            }
        }
        let properties = body
            .map(|class| class_properties(class, self.ctx))
            .unwrap_or_default();

        let range = self.ctx.source_range(span.start, span.end);
        let data = MixinData {
            name: name.clone(),
            mixins,
            properties,
            description: doc.and_then(|doc| doc.description),
        };
        self.ctx
            .add_feature(Feature::new(range, FeatureData::ElementMixin(data)).with_identifiers([name]));
    }

    fn function_declaration(&mut self, function: &Function<'_>) {
        let name = function.id.as_ref().map(|id| id.name.to_string());
        let body = class_extending_param(
            &function.params,
            function.body.as_ref().and_then(|body| returned_expression(body)),
        );
        self.candidate(name, body, function.span);
    }
}

impl<'a> Visit<'a> for MixinVisitor<'_, '_> {
    fn visit_statement(&mut self, statement: &Statement<'a>) {
        self.docs.enter(statement);
        match statement {
            Statement::FunctionDeclaration(function) => self.function_declaration(function),
            Statement::ExportNamedDeclaration(export) => {
                if let Some(Declaration::FunctionDeclaration(function)) = &export.declaration {
                    self.function_declaration(function);
                }
            }
            _ => {}
        }
        walk::walk_statement(self, statement);
        self.docs.leave();
    }

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'a>) {
        if let Some(init) = &declarator.init {
            self.candidate(binding_name(&declarator.id), mixin_class(init), declarator.span);
        }
        walk::walk_variable_declarator(self, declarator);
    }

    fn visit_assignment_expression(&mut self, assignment: &AssignmentExpression<'a>) {
        if is_function_like(&assignment.right) {
            self.candidate(
                target_path(&assignment.left),
                mixin_class(&assignment.right),
                assignment.span,
            );
        }
        walk::walk_assignment_expression(self, assignment);
    }
}

fn is_function_like(expr: &Expression<'_>) -> bool {
    matches!(
        unparen(expr),
        Expression::ArrowFunctionExpression(_)
            | Expression::FunctionExpression(_)
            | Expression::CallExpression(_)
    )
}

/// The class a mixin function returns, unwrapping wrapper calls.
fn mixin_class<'b, 'a>(value: &'b Expression<'a>) -> Option<&'b Class<'a>> {
    match unparen(value) {
        Expression::CallExpression(call) => call
            .arguments
            .iter()
            .filter_map(Argument::as_expression)
            .find_map(|arg| mixin_class(arg)),
        Expression::ArrowFunctionExpression(arrow) => {
            class_extending_param(&arrow.params, arrow_result(&arrow.body, arrow.expression))
        }
        Expression::FunctionExpression(function) => class_extending_param(
            &function.params,
            function.body.as_ref().and_then(|body| returned_expression(body)),
        ),
        _ => None,
    }
}

/// `result` when it is `class extends <param>` (possibly through further
/// mixin applications, `class extends A(B(param))`).
fn class_extending_param<'b, 'a>(
    params: &FormalParameters<'a>,
    result: Option<&'b Expression<'a>>,
) -> Option<&'b Class<'a>> {
    let Expression::ClassExpression(class) = unparen(result?) else {
        return None;
    };
    let base = heritage(class.super_class.as_ref()).superclass?;
    parameter_names(params).contains(&base).then_some(&**class)
}
