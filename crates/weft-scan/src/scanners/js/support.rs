//! AST helpers shared by the JavaScript scanners.

use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentTarget, BindingPattern, BindingPatternKind, Class,
    ClassElement, Expression, FormalParameters, FunctionBody, MethodDefinitionKind,
    ObjectExpression, ObjectPropertyKind, Program, Statement,
};
use oxc_span::{GetSpan, Span};
use rustc_hash::FxHashMap;
use weft_core::{PropertyDescriptor, Warning, WarningCode};

use crate::jsdoc::{JsDoc, parse_jsdoc};
use crate::scanner::ScanContext;

/// Base classes that make a class a custom element on their own.
const ELEMENT_BASES: [&str; 5] = [
    "HTMLElement",
    "PolymerElement",
    "LitElement",
    "Polymer.Element",
    "Polymer.LegacyElement",
];

pub(crate) fn is_element_base(path: &str) -> bool {
    ELEMENT_BASES.contains(&path)
}

/// JSDoc blocks keyed by the start of the token they are attached to.
#[derive(Debug, Default)]
pub(crate) struct JsDocIndex {
    docs: FxHashMap<u32, JsDoc>,
}

impl JsDocIndex {
    pub(crate) fn new(program: &Program<'_>) -> Self {
        let mut docs = FxHashMap::default();
        for comment in program.comments.iter() {
            if !comment.is_jsdoc() {
                continue;
            }
            let span = comment.content_span();
            if let Some(raw) = program.source_text.get(span.start as usize..span.end as usize) {
                // The closest block wins when several share a target.
                docs.insert(comment.attached_to, parse_jsdoc(raw));
            }
        }
        Self { docs }
    }

    pub(crate) fn get(&self, start: u32) -> Option<&JsDoc> {
        self.docs.get(&start)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, &JsDoc)> {
        self.docs.iter().map(|(start, doc)| (*start, doc))
    }
}

/// Tracks the enclosing statements so a node can find the JSDoc that was
/// written above its statement (`/** ... */ export const X = ...`).
#[derive(Debug)]
pub(crate) struct DocScope {
    index: JsDocIndex,
    statements: Vec<u32>,
}

impl DocScope {
    pub(crate) fn new(program: &Program<'_>) -> Self {
        Self {
            index: JsDocIndex::new(program),
            statements: Vec::new(),
        }
    }

    pub(crate) fn enter(&mut self, statement: &Statement<'_>) {
        self.statements.push(statement.span().start);
    }

    pub(crate) fn leave(&mut self) {
        self.statements.pop();
    }

    /// JSDoc attached to the node itself.
    pub(crate) fn exact(&self, node_start: u32) -> Option<JsDoc> {
        self.index.get(node_start).cloned()
    }

    /// JSDoc attached to the node, or else to its innermost statement.
    pub(crate) fn lookup(&self, node_start: u32) -> Option<JsDoc> {
        self.index
            .get(node_start)
            .or_else(|| self.statements.last().and_then(|start| self.index.get(*start)))
            .cloned()
    }
}

pub(crate) fn unparen<'e, 'a>(mut expr: &'e Expression<'a>) -> &'e Expression<'a> {
    while let Expression::ParenthesizedExpression(inner) = expr {
        expr = &inner.expression;
    }
    expr
}

/// Dotted path of an identifier or static member chain, without a leading
/// `window.`.
pub(crate) fn member_path(expr: &Expression<'_>) -> Option<String> {
    raw_member_path(expr).map(strip_window)
}

fn raw_member_path(expr: &Expression<'_>) -> Option<String> {
    match unparen(expr) {
        Expression::Identifier(ident) => Some(ident.name.to_string()),
        Expression::ThisExpression(_) => Some("this".to_string()),
        Expression::StaticMemberExpression(member) => Some(format!(
            "{}.{}",
            raw_member_path(&member.object)?,
            member.property.name
        )),
        _ => None,
    }
}

fn strip_window(path: String) -> String {
    match path.strip_prefix("window.") {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

/// Dotted path of a simple assignment target.
pub(crate) fn target_path(target: &AssignmentTarget<'_>) -> Option<String> {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(ident) => Some(ident.name.to_string()),
        AssignmentTarget::StaticMemberExpression(member) => Some(strip_window(format!(
            "{}.{}",
            raw_member_path(&member.object)?,
            member.property.name
        ))),
        _ => None,
    }
}

pub(crate) fn binding_name(pattern: &BindingPattern<'_>) -> Option<String> {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => Some(ident.name.to_string()),
        _ => None,
    }
}

/// Value of a string literal or an expression-free template literal.
pub(crate) fn string_value(expr: &Expression<'_>) -> Option<String> {
    match unparen(expr) {
        Expression::StringLiteral(literal) => Some(literal.value.to_string()),
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => {
            let quasi = template.quasis.first()?;
            Some(
                quasi
                    .value
                    .cooked
                    .as_ref()
                    .unwrap_or(&quasi.value.raw)
                    .to_string(),
            )
        }
        _ => None,
    }
}

pub(crate) fn first_argument<'e, 'a>(arguments: &'e [Argument<'a>]) -> Option<&'e Expression<'a>> {
    arguments.first().and_then(Argument::as_expression)
}

/// Dotted paths of the elements of an array literal.
pub(crate) fn array_paths(expr: &Expression<'_>) -> Vec<String> {
    let Expression::ArrayExpression(array) = unparen(expr) else {
        return member_path(expr).into_iter().collect();
    };
    array
        .elements
        .iter()
        .filter_map(ArrayExpressionElement::as_expression)
        .filter_map(member_path)
        .collect()
}

/// What a class expression extends, unwrapped through mixin applications.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Heritage {
    pub superclass: Option<String>,
    /// Outermost mixin first: `A(B(Base))` yields `[A, B]`.
    pub mixins: Vec<String>,
    /// Legacy behaviors applied with `mixinBehaviors([...], Base)`.
    pub behaviors: Vec<String>,
}

pub(crate) fn heritage(super_class: Option<&Expression<'_>>) -> Heritage {
    let mut heritage = Heritage::default();
    let Some(mut current) = super_class.map(unparen) else {
        return heritage;
    };

    loop {
        let Expression::CallExpression(call) = current else {
            heritage.superclass = member_path(current);
            return heritage;
        };
        let callee = member_path(&call.callee);
        let is_behavior_call = callee
            .as_deref()
            .is_some_and(|name| name.rsplit('.').next() == Some("mixinBehaviors"));

        let next = if is_behavior_call {
            if let Some(behaviors) = first_argument(&call.arguments) {
                heritage.behaviors.extend(array_paths(behaviors));
            }
            call.arguments.get(1).and_then(Argument::as_expression)
        } else {
            heritage.mixins.extend(callee);
            first_argument(&call.arguments)
        };

        match next {
            Some(expr) => current = unparen(expr),
            None => return heritage,
        }
    }
}

/// Expression a function body evaluates to: the first top-level `return`.
pub(crate) fn returned_expression<'b, 'a>(body: &'b FunctionBody<'a>) -> Option<&'b Expression<'a>> {
    body.statements.iter().find_map(|statement| match statement {
        Statement::ReturnStatement(ret) => ret.argument.as_ref(),
        _ => None,
    })
}

/// Expression an arrow function evaluates to.
pub(crate) fn arrow_result<'b, 'a>(
    body: &'b FunctionBody<'a>,
    expression_body: bool,
) -> Option<&'b Expression<'a>> {
    if expression_body {
        match body.statements.first() {
            Some(Statement::ExpressionStatement(statement)) => Some(&statement.expression),
            _ => None,
        }
    } else {
        returned_expression(body)
    }
}

pub(crate) fn parameter_names(params: &FormalParameters<'_>) -> Vec<String> {
    params
        .items
        .iter()
        .filter_map(|param| binding_name(&param.pattern))
        .collect()
}

/// A named static member of a class: `static get name() { return x }` or
/// `static name = x`.
pub(crate) enum StaticMember<'b, 'a> {
    Value(&'b Expression<'a>),
    /// Present, but its value could not be read statically.
    Opaque(Span),
}

pub(crate) fn static_member<'b, 'a>(class: &'b Class<'a>, name: &str) -> Option<StaticMember<'b, 'a>> {
    class.body.body.iter().find_map(|element| match element {
        ClassElement::MethodDefinition(method)
            if method.r#static
                && matches!(method.kind, MethodDefinitionKind::Get)
                && method.key.static_name().as_deref() == Some(name) =>
        {
            Some(
                method
                    .value
                    .body
                    .as_ref()
                    .and_then(|body| returned_expression(body))
                    .map(StaticMember::Value)
                    .unwrap_or(StaticMember::Opaque(method.span)),
            )
        }
        ClassElement::PropertyDefinition(property)
            if property.r#static && property.key.static_name().as_deref() == Some(name) =>
        {
            Some(
                property
                    .value
                    .as_ref()
                    .map(StaticMember::Value)
                    .unwrap_or(StaticMember::Opaque(property.span)),
            )
        }
        _ => None,
    })
}

/// `static get is()` / `static is = '...'`.
pub(crate) fn static_is(class: &Class<'_>) -> Option<String> {
    match static_member(class, "is")? {
        StaticMember::Value(expr) => string_value(expr),
        StaticMember::Opaque(_) => None,
    }
}

/// Declared properties of a class, from `static get properties()` or
/// `static properties = {...}`.
pub(crate) fn class_properties(class: &Class<'_>, ctx: &mut ScanContext<'_>) -> Vec<PropertyDescriptor> {
    match static_member(class, "properties") {
        None => Vec::new(),
        Some(StaticMember::Value(expr)) => match unparen(expr) {
            Expression::ObjectExpression(object) => object_properties(object, ctx),
            other => {
                let span = other.span();
                malformed(ctx, "static properties must be an object literal", span);
                Vec::new()
            }
        },
        Some(StaticMember::Opaque(span)) => {
            malformed(ctx, "static properties must be an object literal", span);
            Vec::new()
        }
    }
}

/// Value of a statically named key in an object literal.
pub(crate) fn object_get<'b, 'a>(object: &'b ObjectExpression<'a>, key: &str) -> Option<&'b Expression<'a>> {
    object.properties.iter().find_map(|property| match property {
        ObjectPropertyKind::ObjectProperty(property)
            if !property.computed && property.key.static_name().as_deref() == Some(key) =>
        {
            Some(&property.value)
        }
        _ => None,
    })
}

/// Property declarations of a Polymer-style `properties` object.
///
/// Each entry is either a type (`name: String`) or a configuration object
/// (`name: {type: String, notify: true}`). Anything else is reported as a
/// malformed property and skipped.
pub(crate) fn object_properties(object: &ObjectExpression<'_>, ctx: &mut ScanContext<'_>) -> Vec<PropertyDescriptor> {
    let mut properties = Vec::new();

    for property in &object.properties {
        let property = match property {
            ObjectPropertyKind::ObjectProperty(property) => property,
            ObjectPropertyKind::SpreadProperty(spread) => {
                malformed(ctx, "spread properties cannot be analyzed", spread.span);
                continue;
            }
        };
        let name = match property.key.static_name() {
            Some(name) if !property.computed => name.to_string(),
            _ => {
                malformed(ctx, "computed property names cannot be analyzed", property.span);
                continue;
            }
        };

        let mut descriptor = PropertyDescriptor::new(name);
        match unparen(&property.value) {
            Expression::Identifier(ident) if !property.method => {
                descriptor.type_name = Some(ident.name.to_string());
            }
            Expression::ObjectExpression(config) => {
                descriptor.type_name = object_get(config, "type").and_then(member_path);
                descriptor.notify = flag(config, "notify");
                descriptor.reflect_to_attribute =
                    flag(config, "reflectToAttribute") || flag(config, "reflect");
                descriptor.read_only = flag(config, "readOnly");
            }
            _ => {
                let message = format!("property `{}` has an unsupported declaration", descriptor.name);
                malformed(ctx, message, property.span);
                continue;
            }
        }
        properties.push(descriptor);
    }

    properties
}

fn flag(object: &ObjectExpression<'_>, key: &str) -> bool {
    matches!(
        object_get(object, key).map(unparen),
        Some(Expression::BooleanLiteral(literal)) if literal.value
    )
}

fn malformed(ctx: &mut ScanContext<'_>, message: impl Into<String>, span: Span) {
    let range = ctx.source_range(span.start, span.end);
    ctx.add_warning(Warning::warning(WarningCode::MalformedProperty, message, range));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_js;
    use oxc_allocator::Allocator;
    use oxc_span::SourceType;

    fn first_class_heritage(source: &str) -> Heritage {
        let allocator = Allocator::default();
        let parsed = parse_js(&allocator, source, SourceType::mjs());
        assert!(parsed.errors.is_empty());
        let Some(Statement::ClassDeclaration(class)) = parsed.program.body.last() else {
            panic!("expected a class declaration");
        };
        heritage(class.super_class.as_ref())
    }

    #[test]
    fn heritage_unwraps_mixin_applications() {
        let heritage = first_class_heritage("class A extends ThemeMixin(window.Polymer.Element) {}");
        assert_eq!(heritage.superclass.as_deref(), Some("Polymer.Element"));
        assert_eq!(heritage.mixins, ["ThemeMixin"]);

        let heritage = first_class_heritage("class A extends Foo.M1(M2((Base))) {}");
        assert_eq!(heritage.superclass.as_deref(), Some("Base"));
        assert_eq!(heritage.mixins, ["Foo.M1", "M2"]);
    }

    #[test]
    fn heritage_reads_legacy_behaviors() {
        let heritage =
            first_class_heritage("class A extends mixinBehaviors([IronA11y, Foo.Bar], PolymerElement) {}");
        assert_eq!(heritage.superclass.as_deref(), Some("PolymerElement"));
        assert!(heritage.mixins.is_empty());
        assert_eq!(heritage.behaviors, ["IronA11y", "Foo.Bar"]);
    }

    #[test]
    fn heritage_of_base_class_is_empty() {
        assert_eq!(first_class_heritage("class A {}"), Heritage::default());
    }
}
