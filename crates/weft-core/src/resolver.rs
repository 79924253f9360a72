//! Import specifier resolution.

use crate::feature::ImportSyntax;
use crate::url::{DocumentUrl, has_scheme};

/// Maps an import specifier, written in `base` with `syntax`, to a package
/// URL.
///
/// The syntax, not the type of `base`, decides how the specifier reads: an
/// inline `<script type="module">` in an HTML file imports with module
/// semantics. Returns `None` when the specifier cannot be mapped; the
/// analyzer turns that into a warning on the importing document.
pub trait Resolver: Send + Sync + std::fmt::Debug {
    fn resolve(&self, specifier: &str, base: &DocumentUrl, syntax: ImportSyntax)
    -> Option<DocumentUrl>;
}

/// Resolver for a single package laid out on disk.
///
/// HTML and CSS references follow URL semantics: anything without a scheme
/// is relative to the referring file. JavaScript module specifiers follow
/// module semantics wherever they appear: `./`, `../` and `/` are relative,
/// while bare names like `@polymer/polymer/polymer-element.js` map into the
/// component directory when one is configured.
#[derive(Debug, Clone, Default)]
pub struct PackageResolver {
    component_dir: Option<String>,
}

impl PackageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve bare module specifiers into `dir` (e.g. `node_modules`).
    pub fn with_component_dir(mut self, dir: impl Into<String>) -> Self {
        let dir = dir.into();
        let dir = dir.trim_matches('/').to_string();
        self.component_dir = (!dir.is_empty()).then_some(dir);
        self
    }

    pub fn component_dir(&self) -> Option<&str> {
        self.component_dir.as_deref()
    }

    fn resolve_bare(&self, specifier: &str) -> Option<DocumentUrl> {
        let dir = self.component_dir.as_deref()?;
        let segments: Vec<&str> = specifier.split('/').collect();
        let package_len = if specifier.starts_with('@') { 2 } else { 1 };
        if segments.len() < package_len || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let path = if segments.len() == package_len {
            // Package root without a manifest lookup.
            format!("{dir}/{specifier}/index.js")
        } else if segments.last().is_some_and(|last| last.contains('.')) {
            format!("{dir}/{specifier}")
        } else {
            format!("{dir}/{specifier}.js")
        };
        DocumentUrl::new(path).ok()
    }
}

impl Resolver for PackageResolver {
    fn resolve(
        &self,
        specifier: &str,
        base: &DocumentUrl,
        syntax: ImportSyntax,
    ) -> Option<DocumentUrl> {
        let specifier = strip_query_and_fragment(specifier.trim());
        if specifier.is_empty() || has_scheme(specifier) || specifier.starts_with("//") {
            return None;
        }

        let is_path = specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier.starts_with('/');
        if is_path || !syntax.is_module() {
            base.join(specifier).ok()
        } else {
            self.resolve_bare(specifier)
        }
    }
}

fn strip_query_and_fragment(specifier: &str) -> &str {
    let end = specifier.find(['?', '#']).unwrap_or(specifier.len());
    &specifier[..end]
}
