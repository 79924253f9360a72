//! Shared test utilities for analyzer tests.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use weft_core::{
    DocumentUrl, Feature, FeatureData, InMemoryLoader, LoadError, LoadResult, Loader, Warning,
};

use crate::Analyzer;

/// JavaScript source defining one custom element.
pub fn element(tag: &str, class: &str) -> String {
    format!("class {class} extends HTMLElement {{}}\ncustomElements.define('{tag}', {class});\n")
}

/// JavaScript source importing `targets` and defining one element.
pub fn module(imports: &[&str], tag: &str, class: &str) -> String {
    let mut source: String = imports
        .iter()
        .map(|target| format!("import '{target}';\n"))
        .collect();
    source.push_str(&element(tag, class));
    source
}

pub fn url(raw: &str) -> DocumentUrl {
    DocumentUrl::new(raw).unwrap()
}

/// Tag names of element features, in query order.
pub fn tags(features: &[&Feature]) -> Vec<String> {
    features
        .iter()
        .filter_map(|feature| match &feature.data {
            FeatureData::Element(element) => element.tag_name.clone(),
            _ => None,
        })
        .collect()
}

pub fn urls<'a>(urls: impl IntoIterator<Item = &'a DocumentUrl>) -> Vec<&'a str> {
    urls.into_iter().map(DocumentUrl::as_str).collect()
}

pub fn errors<'a>(warnings: &[&'a Warning]) -> Vec<&'a Warning> {
    warnings.iter().copied().filter(|warning| warning.is_error()).collect()
}

/// In-memory loader that counts loads and can be told to fail.
#[derive(Debug, Default)]
pub struct TestLoader {
    files: InMemoryLoader,
    loads: Mutex<FxHashMap<DocumentUrl, usize>>,
    failing: Mutex<FxHashSet<DocumentUrl>>,
    held: Mutex<FxHashMap<DocumentUrl, Arc<Semaphore>>>,
}

impl TestLoader {
    pub fn new(files: &[(&str, &str)]) -> Arc<Self> {
        let loader = Self::default();
        for (path, content) in files {
            loader.files.set(*path, *content).unwrap();
        }
        Arc::new(loader)
    }

    pub fn set(&self, path: &str, content: &str) {
        self.files.set(path, content).unwrap();
    }

    /// Make every load of `path` fail with an I/O error.
    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(url(path));
    }

    pub fn recover(&self, path: &str) {
        self.failing.lock().remove(&url(path));
    }

    /// Make loads of `path` read their content, then wait for `release`.
    pub fn hold(&self, path: &str) {
        self.held.lock().insert(url(path), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, path: &str) {
        if let Some(gate) = self.held.lock().remove(&url(path)) {
            gate.close();
        }
    }

    pub fn loads(&self, path: &str) -> usize {
        self.loads.lock().get(&url(path)).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().values().sum()
    }
}

#[async_trait]
impl Loader for TestLoader {
    fn can_load(&self, _url: &DocumentUrl) -> bool {
        true
    }

    async fn load(&self, url: &DocumentUrl) -> LoadResult<String> {
        *self.loads.lock().entry(url.clone()).or_default() += 1;
        // Give concurrent requests a chance to interleave.
        tokio::task::yield_now().await;
        if self.failing.lock().contains(url) {
            return Err(LoadError::Io {
                url: url.clone(),
                message: "permission denied".to_string(),
            });
        }
        let content = self.files.load(url).await;
        let gate = self.held.lock().get(url).cloned();
        if let Some(gate) = gate {
            // Closing the gate fails every waiter at once.
            let _ = gate.acquire().await;
        }
        content
    }

    async fn list_package_files(&self) -> LoadResult<Vec<DocumentUrl>> {
        self.files.list_package_files().await
    }
}

/// Yield until `path` was loaded at least `count` times.
pub async fn wait_for_loads(loader: &TestLoader, path: &str, count: usize) {
    for _ in 0..1_000 {
        if loader.loads(path) >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("{path} was loaded {} times, expected {count}", loader.loads(path));
}

pub fn analyzer(loader: &Arc<TestLoader>) -> Analyzer {
    Analyzer::builder().shared_loader(loader.clone()).build()
}

/// Create a project on disk with the given files.
pub fn create_test_project(temp: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = temp.path().to_path_buf();
    for (path, content) in files {
        let file_path = root.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file_path, content).unwrap();
    }
    root
}
