//! Package-relative document URLs.
//!
//! Every document the analyzer touches is addressed by a [`DocumentUrl`]: a
//! normalized, `/`-separated path relative to the package root. Normalization
//! happens once at construction so equality and hashing are plain string
//! comparisons everywhere else (cache keys, graph nodes, feature ranges).

use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

/// Errors produced when a string cannot be turned into a [`DocumentUrl`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    /// The input was empty (or normalized to the package root itself).
    #[error("document URL is empty")]
    Empty,

    /// The input climbs above the package root with `..` segments.
    #[error("document URL '{0}' escapes the package root")]
    OutsideRoot(String),

    /// The input carries a scheme (`https:`, `data:`...) and is not package-relative.
    #[error("document URL '{0}' is not package-relative")]
    NotRelative(String),
}

/// A normalized package-relative URL such as `src/x-foo.js`.
///
/// Cloning is cheap (`Arc<str>`), which matters because URLs are used as keys
/// in several maps at once.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentUrl(Arc<str>);

impl DocumentUrl {
    /// Parse and normalize a package-relative URL.
    ///
    /// Leading `/` and `./` are dropped, `.` and `..` segments are folded, and
    /// backslashes are treated as separators.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UrlError> {
        normalize(raw.as_ref()).map(|normalized| Self(Arc::from(normalized)))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Lowercase-agnostic file extension of the last segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// The directory part of the URL (`""` for files at the package root).
    pub fn directory(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        }
    }

    /// Iterate over the `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Resolve `relative` against this URL's directory.
    ///
    /// A leading `/` resolves against the package root instead.
    pub fn join(&self, relative: &str) -> Result<Self, UrlError> {
        let relative = relative.replace('\\', "/");
        if relative.starts_with('/') {
            return Self::new(relative);
        }
        let dir = self.directory();
        if dir.is_empty() {
            Self::new(relative)
        } else {
            Self::new(format!("{dir}/{relative}"))
        }
    }
}

impl fmt::Debug for DocumentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentUrl({:?})", self.0)
    }
}

impl fmt::Display for DocumentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentUrl {
    type Error = UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DocumentUrl {
    type Error = UrlError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentUrl> for String {
    fn from(url: DocumentUrl) -> Self {
        url.0.to_string()
    }
}

/// Returns `true` when `input` starts with a URL scheme such as `https:`.
pub fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once(':') else {
        return false;
    };
    // Single letters are drive prefixes, not schemes.
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn normalize(raw: &str) -> Result<String, UrlError> {
    let raw = raw.trim();
    if has_scheme(raw) || raw.starts_with("//") {
        return Err(UrlError::NotRelative(raw.to_string()));
    }

    let unified = raw.replace('\\', "/");
    let trimmed = unified.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let cleaned = Path::new(trimmed).clean();
    let mut normalized = String::with_capacity(trimmed.len());
    for component in cleaned.components() {
        match component {
            Component::Normal(segment) => {
                if !normalized.is_empty() {
                    normalized.push('/');
                }
                normalized.push_str(&segment.to_string_lossy());
            }
            Component::ParentDir => return Err(UrlError::OutsideRoot(raw.to_string())),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if normalized.is_empty() {
        return Err(UrlError::Empty);
    }
    Ok(normalized)
}
