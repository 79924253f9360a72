//! Context-free per-file analysis results.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::feature::{Feature, ImportFeature};
use crate::span::SourceRange;
use crate::url::DocumentUrl;
use crate::warning::Warning;

/// BLAKE3 digest of a document's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    pub fn of(content: &str) -> Self {
        Self(blake3::hash(content.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Eight bytes is plenty to tell versions apart in logs.
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// The languages the analyzer has parsers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Js,
    Css,
    Json,
}

impl ContentType {
    /// Detect the content type from a URL's extension.
    pub fn from_url(url: &DocumentUrl) -> Option<Self> {
        let ext = url.extension()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(ContentType::Html),
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "mts" | "cts" => Some(ContentType::Js),
            "css" => Some(ContentType::Css),
            "json" => Some(ContentType::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Html => "html",
            ContentType::Js => "js",
            ContentType::Css => "css",
            ContentType::Json => "json",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parser-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxError {
    pub message: String,
    pub source_range: SourceRange,
}

/// The result of parsing and scanning one file in isolation.
///
/// Shared behind `Arc` by the scanned-document cache and never mutated after
/// construction. It holds no reference to any other document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedDocument {
    pub url: DocumentUrl,
    #[serde(skip)]
    pub content: Arc<str>,
    pub content_hash: ContentHash,
    pub content_type: Option<ContentType>,
    pub parse_errors: Vec<SyntaxError>,
    /// Features in source order.
    pub features: Vec<Feature>,
    pub warnings: Vec<Warning>,
}

impl ScannedDocument {
    /// Import features in source order.
    pub fn imports(&self) -> impl Iterator<Item = (&Feature, &ImportFeature)> {
        self.features
            .iter()
            .filter_map(|feature| feature.as_import().map(|import| (feature, import)))
    }

    /// Resolved import targets in source order (duplicates preserved).
    pub fn import_targets(&self) -> impl Iterator<Item = &DocumentUrl> {
        self.imports()
            .filter_map(|(_, import)| import.resolved_url.as_ref())
    }

    pub fn has_parse_errors(&self) -> bool {
        !self.parse_errors.is_empty()
    }
}
