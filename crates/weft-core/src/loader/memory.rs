//! In-memory loader, mostly for tests and editor integrations.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{LoadError, LoadResult, Loader};
use crate::url::{DocumentUrl, UrlError};

/// A loader backed by a mutable map of URL to content.
///
/// Editing the map does not notify anyone; callers pair `set` with
/// `Analyzer::files_changed` the same way an editor integration would.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    files: RwLock<FxHashMap<DocumentUrl, Arc<str>>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a loader from `(url, content)` pairs.
    pub fn from_files<I, U, C>(files: I) -> Result<Self, UrlError>
    where
        I: IntoIterator<Item = (U, C)>,
        U: AsRef<str>,
        C: Into<Arc<str>>,
    {
        let loader = Self::new();
        for (url, content) in files {
            loader.set(url, content)?;
        }
        Ok(loader)
    }

    /// Insert or replace a file. Returns the normalized URL.
    pub fn set(
        &self,
        url: impl AsRef<str>,
        content: impl Into<Arc<str>>,
    ) -> Result<DocumentUrl, UrlError> {
        let url = DocumentUrl::new(url)?;
        self.files.write().insert(url.clone(), content.into());
        Ok(url)
    }

    pub fn remove(&self, url: &DocumentUrl) -> bool {
        self.files.write().remove(url).is_some()
    }

    pub fn contains(&self, url: &DocumentUrl) -> bool {
        self.files.read().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl Loader for InMemoryLoader {
    fn can_load(&self, url: &DocumentUrl) -> bool {
        self.contains(url)
    }

    async fn load(&self, url: &DocumentUrl) -> LoadResult<String> {
        self.files
            .read()
            .get(url)
            .map(|content| content.to_string())
            .ok_or_else(|| LoadError::NotFound(url.clone()))
    }

    async fn list_package_files(&self) -> LoadResult<Vec<DocumentUrl>> {
        let mut urls: Vec<_> = self.files.read().keys().cloned().collect();
        urls.sort();
        Ok(urls)
    }
}
