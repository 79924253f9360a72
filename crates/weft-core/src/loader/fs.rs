//! Filesystem-backed loader.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use path_clean::PathClean;
use walkdir::{DirEntry, WalkDir};

use super::{LoadError, LoadResult, Loader};
use crate::url::DocumentUrl;

/// Maximum file size in bytes (10 MB).
///
/// Files larger than this are rejected with [`LoadError::TooLarge`].
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Loads documents from a package directory on disk.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
    max_file_size: u64,
    ignored_dirs: Vec<String>,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into().clean(),
            max_file_size: MAX_FILE_SIZE,
            ignored_dirs: Vec::new(),
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Directory names that [`Loader::list_package_files`] will not descend into.
    ///
    /// Hidden directories are always skipped.
    pub fn with_ignored_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The on-disk path of `url`. URLs are normalized, so this never leaves the root.
    pub fn path_for(&self, url: &DocumentUrl) -> PathBuf {
        self.root.join(url.as_str())
    }

    /// Convert an on-disk path inside the root back into a URL.
    pub fn url_for(&self, path: &Path) -> Option<DocumentUrl> {
        let relative = path.strip_prefix(&self.root).ok()?;
        DocumentUrl::new(relative.to_string_lossy()).ok()
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.ignored_dirs.iter().any(|dir| *dir == name)
    }
}

#[async_trait]
impl Loader for FsLoader {
    fn can_load(&self, _url: &DocumentUrl) -> bool {
        true
    }

    async fn load(&self, url: &DocumentUrl) -> LoadResult<String> {
        let path = self.path_for(url);
        let io_error = |error: std::io::Error| match error.kind() {
            ErrorKind::NotFound => LoadError::NotFound(url.clone()),
            _ => LoadError::Io {
                url: url.clone(),
                message: error.to_string(),
            },
        };

        let metadata = tokio::fs::metadata(&path).await.map_err(io_error)?;
        if !metadata.is_file() {
            return Err(LoadError::NotFound(url.clone()));
        }
        if metadata.len() > self.max_file_size {
            return Err(LoadError::TooLarge {
                url: url.clone(),
                size: metadata.len(),
                max: self.max_file_size,
            });
        }

        let bytes = tokio::fs::read(&path).await.map_err(io_error)?;
        tracing::trace!(url = %url, bytes = bytes.len(), "loaded from disk");
        String::from_utf8(bytes).map_err(|_| LoadError::InvalidUtf8(url.clone()))
    }

    async fn list_package_files(&self) -> LoadResult<Vec<DocumentUrl>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry));

        for entry in walker {
            let entry = entry.map_err(|error| LoadError::Listing(error.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(url) = self.url_for(entry.path()) {
                files.push(url);
            }
        }

        files.sort();
        tracing::debug!(root = %self.root.display(), count = files.len(), "listed package files");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (path, content) in files {
            let file_path = temp.path().join(path);
            fs::create_dir_all(file_path.parent().unwrap()).unwrap();
            fs::write(file_path, content).unwrap();
        }
        temp
    }

    #[tokio::test]
    async fn loads_existing_files() {
        let temp = project(&[("src/x-foo.js", "export {};")]);
        let loader = FsLoader::new(temp.path());
        let url = DocumentUrl::new("src/x-foo.js").unwrap();
        assert_eq!(loader.load(&url).await.unwrap(), "export {};");
    }

    #[tokio::test]
    async fn missing_files_are_not_found() {
        let temp = project(&[]);
        let loader = FsLoader::new(temp.path());
        let url = DocumentUrl::new("nope.js").unwrap();
        assert_eq!(loader.load(&url).await, Err(LoadError::NotFound(url)));
    }

    #[tokio::test]
    async fn directories_are_not_documents() {
        let temp = project(&[("src/a.js", "")]);
        let loader = FsLoader::new(temp.path());
        let url = DocumentUrl::new("src").unwrap();
        assert!(matches!(loader.load(&url).await, Err(LoadError::NotFound(_))));
    }

    #[tokio::test]
    async fn enforces_size_limit() {
        let temp = project(&[("big.js", "0123456789")]);
        let loader = FsLoader::new(temp.path()).with_max_file_size(4);
        let url = DocumentUrl::new("big.js").unwrap();
        assert!(matches!(
            loader.load(&url).await,
            Err(LoadError::TooLarge { size: 10, max: 4, .. })
        ));
    }

    #[tokio::test]
    async fn rejects_binary_content() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blob.js"), [0xff, 0xfe, 0x00]).unwrap();
        let loader = FsLoader::new(temp.path());
        let url = DocumentUrl::new("blob.js").unwrap();
        assert_eq!(loader.load(&url).await, Err(LoadError::InvalidUtf8(url)));
    }

    #[tokio::test]
    async fn lists_files_skipping_hidden_and_ignored_dirs() {
        let temp = project(&[
            ("index.html", ""),
            ("src/a.js", ""),
            (".git/config", ""),
            ("node_modules/lib/index.js", ""),
        ]);
        let loader = FsLoader::new(temp.path()).with_ignored_dirs(["node_modules"]);
        let files = loader.list_package_files().await.unwrap();
        let names: Vec<_> = files.iter().map(|url| url.as_str()).collect();
        assert_eq!(names, ["index.html", "src/a.js"]);
    }
}
