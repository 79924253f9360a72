//! The loader contract.
//!
//! A [`Loader`] turns a [`DocumentUrl`] into text. The analyzer is
//! constructed with exactly one loader and never touches the filesystem (or
//! network) itself, so the same engine runs against disk, an editor's
//! unsaved buffers, or an in-memory map in tests.

mod fs;
mod memory;

pub use fs::{FsLoader, MAX_FILE_SIZE};
pub use memory::InMemoryLoader;

use async_trait::async_trait;

use crate::url::DocumentUrl;

/// Result type for loader operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading a document.
///
/// `Clone` so that a single failed load can be shared by every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Nothing exists at this URL
    #[error("file not found: {0}")]
    NotFound(DocumentUrl),

    /// The underlying read failed
    #[error("failed to read {url}: {message}")]
    Io { url: DocumentUrl, message: String },

    /// The file exceeds the loader's size limit
    #[error("{url} is too large ({size} bytes, limit is {max} bytes)")]
    TooLarge {
        url: DocumentUrl,
        size: u64,
        max: u64,
    },

    /// The file is not valid UTF-8 text
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(DocumentUrl),

    /// Enumerating the package failed
    #[error("failed to list package files: {0}")]
    Listing(String),

    /// The loader does not implement the requested operation
    #[error("unsupported loader operation: {0}")]
    Unsupported(String),
}

/// Source of document text.
#[async_trait]
pub trait Loader: Send + Sync + std::fmt::Debug {
    /// Whether this loader can be asked for `url` at all.
    fn can_load(&self, url: &DocumentUrl) -> bool;

    /// Load the full text of `url`.
    async fn load(&self, url: &DocumentUrl) -> LoadResult<String>;

    /// List every file in the package.
    ///
    /// This is the package-scanning contract used by package-wide analysis;
    /// loaders that cannot enumerate their contents keep the default.
    async fn list_package_files(&self) -> LoadResult<Vec<DocumentUrl>> {
        Err(LoadError::Unsupported(
            "this loader cannot list package files".to_string(),
        ))
    }
}
