//! End-to-end scanning of realistic component sources through the default registry.

use std::sync::Arc;

use weft_core::{
    BehaviorData, DocumentUrl, ElementData, Feature, FeatureData, FeatureKind, MixinData,
    NamespaceData, PackageResolver, ScannedDocument, WarningCode,
};
use weft_scan::ScanPipeline;

fn scan(path: &str, source: &str) -> ScannedDocument {
    let url = DocumentUrl::new(path).unwrap();
    let resolver = PackageResolver::new().with_component_dir("node_modules");
    ScanPipeline::default().scan(&url, Arc::from(source), &resolver)
}

fn elements(doc: &ScannedDocument) -> Vec<&ElementData> {
    doc.features
        .iter()
        .filter_map(|feature| match &feature.data {
            FeatureData::Element(element) => Some(element),
            _ => None,
        })
        .collect()
}

fn of_kind(doc: &ScannedDocument, kind: FeatureKind) -> Vec<&Feature> {
    doc.features.iter().filter(|f| f.kind() == kind).collect()
}

#[test]
fn polymer_element_class() {
    let doc = scan(
        "src/fancy-button.js",
        r#"import {PolymerElement} from '@polymer/polymer/polymer-element.js';
import {ThemeMixin} from './theme-mixin.js';

/**
 * A fancy button.
 * @customElement
 * @polymer
 */
class FancyButton extends ThemeMixin(PolymerElement) {
  static get is() { return 'fancy-button'; }
  static get properties() {
    return {
      label: String,
      pressed: {type: Boolean, notify: true, reflectToAttribute: true},
      ...extra,
    };
  }
}
customElements.define(FancyButton.is, FancyButton);
"#,
    );

    let imports: Vec<_> = doc
        .imports()
        .map(|(_, import)| import.resolved_url.as_ref().map(|url| url.as_str().to_string()))
        .collect();
    assert_eq!(
        imports,
        [
            Some("node_modules/@polymer/polymer/polymer-element.js".to_string()),
            Some("src/theme-mixin.js".to_string()),
        ]
    );

    let found = elements(&doc);
    assert_eq!(found.len(), 1);
    let element = found[0];
    assert_eq!(element.tag_name.as_deref(), Some("fancy-button"));
    assert_eq!(element.class_name.as_deref(), Some("FancyButton"));
    assert_eq!(element.superclass.as_deref(), Some("PolymerElement"));
    assert_eq!(element.mixins, ["ThemeMixin"]);
    assert_eq!(element.description.as_deref(), Some("A fancy button."));

    let names: Vec<_> = element.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["label", "pressed"]);
    assert_eq!(element.properties[0].type_name.as_deref(), Some("String"));
    assert!(element.properties[1].notify);
    assert!(element.properties[1].reflect_to_attribute);
    assert!(!element.properties[1].read_only);

    let malformed: Vec<_> = doc
        .warnings
        .iter()
        .filter(|w| w.code == WarningCode::MalformedProperty)
        .collect();
    assert_eq!(malformed.len(), 1);
    assert_eq!(malformed[0].source_range.start.line, 14);
}

#[test]
fn decorated_lit_element() {
    let doc = scan(
        "src/my-greeting.ts",
        r#"import {LitElement} from 'lit';
import {customElement} from 'lit/decorators.js';

@customElement('my-greeting')
class MyGreeting extends LitElement {
  static properties = {name: {type: String, reflect: true}};
}
"#,
    );
    assert!(!doc.has_parse_errors(), "{:?}", doc.parse_errors);
    let found = elements(&doc);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].tag_name.as_deref(), Some("my-greeting"));
    assert_eq!(found[0].superclass.as_deref(), Some("LitElement"));
    assert_eq!(found[0].properties[0].type_name.as_deref(), Some("String"));
    assert!(found[0].properties[0].reflect_to_attribute);

    let lit = doc.imports().next().unwrap().1;
    assert_eq!(
        lit.resolved_url.as_ref().map(DocumentUrl::as_str),
        Some("node_modules/lit/index.js")
    );
}

#[test]
fn legacy_polymer_call() {
    let doc = scan(
        "legacy-el.html",
        r#"<link rel="import" href="../polymer/polymer.html">
<script>
  /** Legacy element. */
  Polymer({
    is: 'legacy-el',
    behaviors: [Polymer.IronButtonState, MyBehavior],
    properties: {active: {type: Boolean, readOnly: true}},
  });
</script>"#,
    );
    let found = elements(&doc);
    assert_eq!(found.len(), 1);
    let element = found[0];
    assert_eq!(element.tag_name.as_deref(), Some("legacy-el"));
    assert_eq!(element.behaviors, ["Polymer.IronButtonState", "MyBehavior"]);
    assert_eq!(element.description.as_deref(), Some("Legacy element."));
    assert!(element.properties[0].read_only);

    // `../polymer/polymer.html` escapes the package root.
    let (_, import) = doc.imports().next().unwrap();
    assert!(import.resolved_url.is_none());

    let feature = of_kind(&doc, FeatureKind::Element)[0];
    assert_eq!(feature.source_range.start.line, 3);
    assert_eq!(feature.source_range.file.as_str(), "legacy-el.html");
}

#[test]
fn define_calls_name_inline_and_foreign_classes() {
    let doc = scan(
        "register.js",
        "customElements.define('inline-el', class extends HTMLElement {});\n\
         customElements.define('imported-el', ImportedEl);\n\
         window.customElements.define('BadName', Bad);\n",
    );
    let features = of_kind(&doc, FeatureKind::Element);
    let summary: Vec<_> = features
        .iter()
        .map(|feature| {
            let FeatureData::Element(element) = &feature.data else {
                unreachable!()
            };
            (
                element.tag_name.clone().unwrap_or_default(),
                element.class_name.clone(),
                feature.warnings.len(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        [
            ("inline-el".to_string(), None, 0),
            ("imported-el".to_string(), Some("ImportedEl".to_string()), 0),
            ("BadName".to_string(), Some("Bad".to_string()), 1),
        ]
    );
    assert!(features[1].has_identifier("ImportedEl"));
    assert_eq!(features[2].warnings[0].code, WarningCode::InvalidElementName);
}

#[test]
fn element_mixins() {
    let doc = scan(
        "theme-mixin.js",
        r#"/**
 * Adds theming.
 * @mixinFunction
 * @polymer
 */
export const ThemeMixin = dedupingMixin((base) => class extends base {
  static get properties() { return {theme: String}; }
});

export const PlainMixin = (superClass) => class extends OtherMixin(superClass) {};

function helper(x) { return class extends x {}; }
"#,
    );
    assert!(elements(&doc).is_empty());

    let mixins: Vec<&MixinData> = doc
        .features
        .iter()
        .filter_map(|feature| match &feature.data {
            FeatureData::ElementMixin(mixin) => Some(mixin),
            _ => None,
        })
        .collect();
    assert_eq!(mixins.len(), 2);
    assert_eq!(mixins[0].name, "ThemeMixin");
    assert_eq!(mixins[0].description.as_deref(), Some("Adds theming."));
    assert_eq!(mixins[0].properties[0].name, "theme");
    assert_eq!(mixins[1].name, "PlainMixin");
    assert_eq!(mixins[1].mixins, ["OtherMixin"]);
}

#[test]
fn behaviors_and_namespaces() {
    let doc = scan(
        "iron-foo.js",
        r#"/**
 * Core namespace.
 * @namespace
 */
window.Polymer = window.Polymer || {};

/** @polymerBehavior Polymer.IronFoo */
Polymer.IronFooImpl = {properties: {size: Number}};

/** @polymerBehavior */
Polymer.IronFoo = [Polymer.IronBar, Polymer.IronFooImpl];

const LocalBehavior = {behaviors: [Polymer.IronFoo]};

/** @namespace Polymer.Foo */
const unrelated = 1;
"#,
    );

    let behaviors: Vec<&BehaviorData> = doc
        .features
        .iter()
        .filter_map(|feature| match &feature.data {
            FeatureData::Behavior(behavior) => Some(behavior),
            _ => None,
        })
        .collect();
    let names: Vec<_> = behaviors.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["Polymer.IronFoo", "Polymer.IronFoo", "LocalBehavior"]);
    assert_eq!(behaviors[0].properties[0].type_name.as_deref(), Some("Number"));
    assert_eq!(behaviors[1].behaviors, ["Polymer.IronBar", "Polymer.IronFooImpl"]);
    assert_eq!(behaviors[2].behaviors, ["Polymer.IronFoo"]);
    let impl_feature = of_kind(&doc, FeatureKind::Behavior)[0];
    assert!(impl_feature.has_identifier("Polymer.IronFooImpl"));

    let namespaces: Vec<&NamespaceData> = doc
        .features
        .iter()
        .filter_map(|feature| match &feature.data {
            FeatureData::Namespace(namespace) => Some(namespace),
            _ => None,
        })
        .collect();
    assert_eq!(namespaces.len(), 2);
    assert_eq!(namespaces[0].name, "Polymer");
    assert_eq!(namespaces[0].description.as_deref(), Some("Core namespace."));
    assert_eq!(namespaces[1].name, "Polymer.Foo");
}

#[test]
fn css_and_html_references() {
    let doc = scan(
        "styles/app.css",
        "@import 'theme.css';\n@import url(\"../base.css\");\nbody { margin: 0 }",
    );
    let targets: Vec<_> = doc.import_targets().map(DocumentUrl::as_str).collect();
    assert_eq!(targets, ["styles/theme.css", "base.css"]);

    let doc = scan(
        "index.html",
        "<style>@import 'a.css';</style>\n<dom-module id=\"x-a\"></dom-module>",
    );
    assert_eq!(doc.import_targets().map(DocumentUrl::as_str).collect::<Vec<_>>(), ["a.css"]);
    assert_eq!(of_kind(&doc, FeatureKind::Generic).len(), 1);
}

#[test]
fn inline_module_scripts_import_packages() {
    let doc = scan(
        "index.html",
        "<script src=\"vendor.js\"></script>\n\
         <script type=\"module\">\n\
         import 'lit';\n\
         import('@polymer/polymer/polymer-element.js');\n\
         </script>",
    );
    let targets: Vec<_> = doc.import_targets().map(DocumentUrl::as_str).collect();
    assert_eq!(
        targets,
        [
            "vendor.js",
            "node_modules/lit/index.js",
            "node_modules/@polymer/polymer/polymer-element.js",
        ]
    );
}

#[test]
fn broken_files_still_produce_documents() {
    let doc = scan("broken.css", "..nope { color: red }");
    assert!(doc.features.is_empty());
    assert_eq!(doc.warnings.iter().filter(|w| w.is_error()).count(), 1);

    let doc = scan("broken.html", "<p>\n<!-- never closed");
    assert_eq!(doc.parse_errors.len(), 1);
    assert_eq!(doc.parse_errors[0].source_range.start.line, 1);
}
