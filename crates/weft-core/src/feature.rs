//! Features: units of semantic information extracted from one file.
//!
//! The set of built-in kinds is closed ([`FeatureData`]); anything a custom
//! scanner wants to report that does not fit goes into
//! [`FeatureData::Generic`] with a JSON payload. Features only ever refer to
//! other documents by [`DocumentUrl`], never by embedding them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::SourceRange;
use crate::url::DocumentUrl;
use crate::warning::Warning;

/// Discriminant of [`FeatureData`], used for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    Import,
    Element,
    ElementMixin,
    Behavior,
    Namespace,
    Generic,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 6] = [
        FeatureKind::Import,
        FeatureKind::Element,
        FeatureKind::ElementMixin,
        FeatureKind::Behavior,
        FeatureKind::Namespace,
        FeatureKind::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Import => "import",
            FeatureKind::Element => "element",
            FeatureKind::ElementMixin => "element-mixin",
            FeatureKind::Behavior => "behavior",
            FeatureKind::Namespace => "namespace",
            FeatureKind::Generic => "generic",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an import's target participates in transitive queries by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Eager,
    Lazy,
}

/// How an import was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportSyntax {
    /// `<link rel="import">` / `<link rel="lazy-import">`
    HtmlImport,
    /// `<script src>`
    HtmlScript,
    /// `<link rel="stylesheet">`
    HtmlStyle,
    /// `import ... from` / side-effect `import '...'`
    JsImport,
    /// `export ... from`
    JsExport,
    /// `import(...)`
    JsDynamicImport,
    /// `@import`
    CssImport,
}

impl ImportSyntax {
    /// Whether the specifier is a JavaScript module specifier, where bare
    /// names refer to packages. Everything else is a URL reference.
    pub fn is_module(self) -> bool {
        matches!(self, Self::JsImport | Self::JsExport | Self::JsDynamicImport)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFeature {
    /// The specifier exactly as written.
    pub specifier: String,
    /// `None` when the resolver could not map the specifier.
    pub resolved_url: Option<DocumentUrl>,
    pub import_kind: ImportKind,
    pub syntax: ImportSyntax,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub notify: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reflect_to_attribute: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementData {
    pub tag_name: Option<String>,
    pub class_name: Option<String>,
    pub superclass: Option<String>,
    pub mixins: Vec<String>,
    pub behaviors: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixinData {
    pub name: String,
    pub mixins: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorData {
    pub name: String,
    pub behaviors: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceData {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericData {
    pub name: String,
    pub data: serde_json::Value,
}

/// Kind-specific payload of a [`Feature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FeatureData {
    Import(ImportFeature),
    Element(ElementData),
    ElementMixin(MixinData),
    Behavior(BehaviorData),
    Namespace(NamespaceData),
    Generic(GenericData),
}

impl FeatureData {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureData::Import(_) => FeatureKind::Import,
            FeatureData::Element(_) => FeatureKind::Element,
            FeatureData::ElementMixin(_) => FeatureKind::ElementMixin,
            FeatureData::Behavior(_) => FeatureKind::Behavior,
            FeatureData::Namespace(_) => FeatureKind::Namespace,
            FeatureData::Generic(_) => FeatureKind::Generic,
        }
    }
}

/// One extracted feature. Immutable once it leaves its scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub source_range: SourceRange,
    /// Names this feature can be looked up by (tag names, class names...).
    pub identifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(flatten)]
    pub data: FeatureData,
}

impl Feature {
    pub fn new(source_range: SourceRange, data: FeatureData) -> Self {
        Self {
            source_range,
            identifiers: Vec::new(),
            warnings: Vec::new(),
            data,
        }
    }

    pub fn with_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for identifier in identifiers {
            let identifier = identifier.into();
            if !identifier.is_empty() && !self.identifiers.contains(&identifier) {
                self.identifiers.push(identifier);
            }
        }
        self
    }

    pub fn with_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    pub fn kind(&self) -> FeatureKind {
        self.data.kind()
    }

    pub fn file(&self) -> &DocumentUrl {
        &self.source_range.file
    }

    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.identifiers.iter().any(|id| id == identifier)
    }

    pub fn as_import(&self) -> Option<&ImportFeature> {
        match &self.data {
            FeatureData::Import(import) => Some(import),
            _ => None,
        }
    }
}
