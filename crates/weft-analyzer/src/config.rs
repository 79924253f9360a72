//! Analyzer configuration.

use serde::{Deserialize, Serialize};
use weft_core::DocumentUrl;

/// Default number of documents loaded and scanned at once.
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Default number of non-default contexts kept cached.
pub const DEFAULT_MAX_CONTEXTS: usize = 16;

/// Directories holding installed third-party components.
pub const DEFAULT_COMPONENT_DIRS: [&str; 2] = ["node_modules", "bower_components"];

/// Settings shared by every resolution an [`Analyzer`](crate::Analyzer) runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Directory names that hold dependencies rather than package sources.
    ///
    /// Documents under any of them are external: left out of queries unless
    /// `external_packages` is requested, and never package entry points.
    pub component_dirs: Vec<String>,

    /// Directory names skipped when discovering package entry points.
    pub exclude_dirs: Vec<String>,

    /// Upper bound on loads and scans in flight for one request.
    pub concurrency: usize,

    /// Contexts other than the default one whose results stay cached,
    /// never below one.
    ///
    /// Past this, the least recently used context is forgotten. An editor
    /// that makes a context per unsaved buffer state would otherwise grow
    /// the cache with every keystroke.
    pub max_contexts: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            component_dirs: DEFAULT_COMPONENT_DIRS.iter().map(|dir| dir.to_string()).collect(),
            exclude_dirs: vec![".git".to_string()],
            concurrency: DEFAULT_CONCURRENCY,
            max_contexts: DEFAULT_MAX_CONTEXTS,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_component_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.component_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_contexts(mut self, max_contexts: usize) -> Self {
        self.max_contexts = max_contexts;
        self
    }

    /// Concurrency limit, never below one.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Whether `url` lives inside a component directory.
    pub fn is_external(&self, url: &DocumentUrl) -> bool {
        url.segments()
            .any(|segment| self.component_dirs.iter().any(|dir| dir == segment))
    }

    /// Whether package discovery should skip `url`.
    pub fn is_excluded(&self, url: &DocumentUrl) -> bool {
        url.segments()
            .any(|segment| self.exclude_dirs.iter().any(|dir| dir == segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> DocumentUrl {
        DocumentUrl::new(raw).unwrap()
    }

    #[test]
    fn external_means_inside_a_component_dir() {
        let config = AnalyzerConfig::default();
        assert!(config.is_external(&url("node_modules/lit/index.js")));
        assert!(config.is_external(&url("src/bower_components/polymer/polymer.html")));
        assert!(!config.is_external(&url("src/node_modules.js")));
        assert!(!config.is_external(&url("src/x-foo.js")));
    }

    #[test]
    fn exclusions_match_whole_segments() {
        let config = AnalyzerConfig::default().with_exclude_dirs(["test", ".git"]);
        assert!(config.is_excluded(&url("test/x-foo_test.html")));
        assert!(config.is_excluded(&url(".git/HEAD")));
        assert!(!config.is_excluded(&url("testing/x.js")));
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"componentDirs": ["web_modules"], "concurrency": 0}"#)
                .unwrap();
        assert_eq!(config.component_dirs, ["web_modules"]);
        assert_eq!(config.exclude_dirs, [".git"]);
        assert_eq!(config.effective_concurrency(), 1);
        assert_eq!(config.max_contexts, DEFAULT_MAX_CONTEXTS);
    }
}
