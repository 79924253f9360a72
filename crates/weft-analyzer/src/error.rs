//! Error types for analysis operations.

use weft_core::{DocumentUrl, LoadError, UrlError};

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// The only ways an analysis request can fail.
///
/// Everything that goes wrong inside a file (syntax errors, unresolvable
/// imports, dependencies that cannot be loaded) is reported as a
/// [`Warning`](weft_core::Warning) on the returned document instead.
///
/// `Clone` so that one failed in-flight request can be handed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The requested URL is not a valid package-relative URL
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    /// The requested document could not be loaded at all
    #[error("failed to load {url}")]
    Load { url: DocumentUrl, source: LoadError },

    /// The loader could not enumerate the package
    #[error("failed to list package files")]
    Package(#[source] LoadError),
}

impl AnalysisError {
    /// The URL this error is about, when there is one.
    pub fn url(&self) -> Option<&DocumentUrl> {
        match self {
            AnalysisError::Load { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Whether the failure is a missing file (as opposed to an I/O problem).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AnalysisError::Load {
                source: LoadError::NotFound(_),
                ..
            }
        )
    }
}
