use oxc_ast::ast::{AssignmentExpression, CallExpression, Class, Expression, Statement, VariableDeclarator};
use oxc_ast_visit::{Visit, walk};
use rustc_hash::{FxHashMap, FxHashSet};
use weft_core::{ContentType, ElementData, Feature, FeatureData, Warning, WarningCode};

use super::support::{
    DocScope, array_paths, binding_name, class_properties, first_argument, heritage,
    is_element_base, member_path, object_get, object_properties, static_is, string_value,
    target_path, unparen,
};
use crate::parse::SyntaxTree;
use crate::scanner::{ScanContext, Scanner};

/// Hyphenated names HTML already reserves (SVG and MathML elements).
const RESERVED_TAG_NAMES: [&str; 8] = [
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Custom element definitions.
///
/// Recognizes element classes (by decorator, `static is`, JSDoc tag,
/// `customElements.define` registration or a known element base class) and
/// legacy `Polymer({is: ...})` calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementScanner;

impl Scanner for ElementScanner {
    fn name(&self) -> &'static str {
        "element"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Js
    }

    fn scan(&self, tree: &SyntaxTree<'_, '_>, ctx: &mut ScanContext<'_>) {
        let SyntaxTree::Js(program) = tree else {
            return;
        };

        let mut registrations = DefineCollector::default();
        registrations.visit_program(program);

        let mut visitor = ElementVisitor {
            ctx,
            docs: DocScope::new(program),
            inferred_names: FxHashMap::default(),
            defines: registrations.defines,
            claimed: FxHashSet::default(),
        };
        visitor.visit_program(program);
        visitor.emit_unclaimed_defines();
    }
}

#[derive(Debug)]
enum DefineTarget {
    Named(String),
    /// A class expression written inline, by its start offset.
    Inline(u32),
    Unknown,
}

#[derive(Debug)]
struct DefineCall {
    tag: String,
    target: DefineTarget,
    start: u32,
    end: u32,
}

#[derive(Debug, Default)]
struct DefineCollector {
    defines: Vec<DefineCall>,
}

impl<'a> Visit<'a> for DefineCollector {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        let is_define = member_path(&call.callee).as_deref() == Some("customElements.define");
        if let Some(tag) = is_define
            .then(|| first_argument(&call.arguments).and_then(string_value))
            .flatten()
        {
            let target = match call.arguments.get(1).and_then(|arg| arg.as_expression()).map(unparen) {
                Some(Expression::ClassExpression(class)) => DefineTarget::Inline(class.span.start),
                Some(expr) => member_path(expr).map_or(DefineTarget::Unknown, DefineTarget::Named),
                None => DefineTarget::Unknown,
            };
            self.defines.push(DefineCall {
                tag,
                target,
                start: call.span.start,
                end: call.span.end,
            });
        }
        walk::walk_call_expression(self, call);
    }
}

struct ElementVisitor<'c, 's> {
    ctx: &'c mut ScanContext<'s>,
    docs: DocScope,
    /// Names of anonymous classes and `Polymer()` calls, by node start.
    inferred_names: FxHashMap<u32, String>,
    defines: Vec<DefineCall>,
    /// Indices into `defines` already matched to a class.
    claimed: FxHashSet<usize>,
}

impl ElementVisitor<'_, '_> {
    fn remember_name(&mut self, name: Option<String>, value: &Expression<'_>) {
        let Some(name) = name else {
            return;
        };
        match unparen(value) {
            Expression::ClassExpression(class) => {
                self.inferred_names.insert(class.span.start, name);
            }
            Expression::CallExpression(call) => {
                self.inferred_names.insert(call.span.start, name);
            }
            _ => {}
        }
    }

    fn claim_define(&mut self, name: Option<&str>, start: u32) -> Option<String> {
        let index = self.defines.iter().position(|define| match &define.target {
            DefineTarget::Named(target) => Some(target.as_str()) == name,
            DefineTarget::Inline(inline) => *inline == start,
            DefineTarget::Unknown => false,
        })?;
        self.claimed.insert(index);
        Some(self.defines[index].tag.clone())
    }

    fn element_class(&mut self, class: &Class<'_>) {
        let start = class.span.start;
        let name = class
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .or_else(|| self.inferred_names.get(&start).cloned());
        // Anonymous inner classes (mixin bodies) must not pick up the
        // documentation of their enclosing statement.
        let doc = if name.is_some() {
            self.docs.lookup(start)
        } else {
            self.docs.exact(start)
        };

        let heritage = heritage(class.super_class.as_ref());
        let doc_tag = doc
            .as_ref()
            .and_then(|doc| doc.tag("customElement"))
            .and_then(|tag| tag.first_word())
            .filter(|word| word.contains('-'))
            .map(str::to_string);
        let defined = self.claim_define(name.as_deref(), start);
        let tag_name = decorator_tag(class)
            .or_else(|| static_is(class))
            .or(doc_tag)
            .or(defined);

        let documented = doc
            .as_ref()
            .is_some_and(|doc| doc.has_tag("customElement") || doc.has_tag("polymer"));
        let is_mixin_body = doc.as_ref().is_some_and(|doc| doc.has_tag("mixinFunction"));
        let extends_element = heritage.superclass.as_deref().is_some_and(is_element_base);
        if tag_name.is_none() && (is_mixin_body || !(documented || extends_element)) {
            return;
        }

        let mut mixins = heritage.mixins;
        if let Some(doc) = &doc {
            for applied in doc.tags_named("appliesMixin").filter_map(|tag| tag.first_word()) {
                if !mixins.iter().any(|mixin| mixin == applied) {
                    mixins.push(applied.to_string());
                }
            }
        }

        let data = ElementData {
            tag_name,
            class_name: name,
            superclass: heritage.superclass,
            mixins,
            behaviors: heritage.behaviors,
            properties: class_properties(class, self.ctx),
            description: doc.and_then(|doc| doc.description),
        };
        self.emit(class.span.start, class.span.end, data);
    }

    fn legacy_element(&mut self, call: &CallExpression<'_>) {
        if member_path(&call.callee).as_deref() != Some("Polymer") {
            return;
        }
        let Some(Expression::ObjectExpression(info)) = first_argument(&call.arguments).map(unparen) else {
            return;
        };

        let properties = match object_get(info, "properties").map(unparen) {
            Some(Expression::ObjectExpression(properties)) => object_properties(properties, self.ctx),
            _ => Vec::new(),
        };
        let start = call.span.start;
        let data = ElementData {
            tag_name: object_get(info, "is").and_then(string_value),
            class_name: self.inferred_names.get(&start).cloned(),
            superclass: None,
            mixins: Vec::new(),
            behaviors: object_get(info, "behaviors").map(array_paths).unwrap_or_default(),
            properties,
            description: self.docs.lookup(start).and_then(|doc| doc.description),
        };
        self.emit(start, call.span.end, data);
    }

    fn emit_unclaimed_defines(&mut self) {
        let defines = std::mem::take(&mut self.defines);
        for (index, define) in defines.into_iter().enumerate() {
            if self.claimed.contains(&index) {
                continue;
            }
            let class_name = match define.target {
                DefineTarget::Inline(_) => continue,
                DefineTarget::Named(name) => Some(name),
                DefineTarget::Unknown => None,
            };
            let data = ElementData {
                tag_name: Some(define.tag),
                class_name,
                ..ElementData::default()
            };
            self.emit(define.start, define.end, data);
        }
    }

    fn emit(&mut self, start: u32, end: u32, data: ElementData) {
        let range = self.ctx.source_range(start, end);
        let identifiers: Vec<String> = data
            .tag_name
            .iter()
            .chain(data.class_name.iter())
            .cloned()
            .collect();
        let problem = data.tag_name.as_deref().and_then(tag_name_problem);

        let mut feature = Feature::new(range.clone(), FeatureData::Element(data)).with_identifiers(identifiers);
        if let Some(problem) = problem {
            feature = feature.with_warning(Warning::warning(WarningCode::InvalidElementName, problem, range));
        }
        self.ctx.add_feature(feature);
    }
}

impl<'a> Visit<'a> for ElementVisitor<'_, '_> {
    fn visit_statement(&mut self, statement: &Statement<'a>) {
        self.docs.enter(statement);
        walk::walk_statement(self, statement);
        self.docs.leave();
    }

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'a>) {
        if let Some(init) = &declarator.init {
            self.remember_name(binding_name(&declarator.id), init);
        }
        walk::walk_variable_declarator(self, declarator);
    }

    fn visit_assignment_expression(&mut self, assignment: &AssignmentExpression<'a>) {
        self.remember_name(target_path(&assignment.left), &assignment.right);
        walk::walk_assignment_expression(self, assignment);
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        self.element_class(class);
        walk::walk_class(self, class);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        self.legacy_element(call);
        walk::walk_call_expression(self, call);
    }
}

/// `@customElement('x-foo')` decorator argument.
fn decorator_tag(class: &Class<'_>) -> Option<String> {
    class.decorators.iter().find_map(|decorator| match unparen(&decorator.expression) {
        Expression::CallExpression(call)
            if member_path(&call.callee).as_deref() == Some("customElement") =>
        {
            first_argument(&call.arguments).and_then(string_value)
        }
        _ => None,
    })
}

/// Why `tag` is not a valid custom element name, if it is not.
fn tag_name_problem(tag: &str) -> Option<String> {
    if !tag.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Some(format!("custom element name `{tag}` must start with a lowercase letter"));
    }
    if !tag.contains('-') {
        return Some(format!("custom element name `{tag}` must contain a hyphen"));
    }
    if tag.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace()) {
        return Some(format!("custom element name `{tag}` must not contain uppercase letters or whitespace"));
    }
    if RESERVED_TAG_NAMES.contains(&tag) {
        return Some(format!("custom element name `{tag}` is reserved"));
    }
    None
}
