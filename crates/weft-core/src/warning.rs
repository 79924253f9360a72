//! Recoverable diagnostics.
//!
//! Past the loader boundary nothing in the analyzer fails: parse errors,
//! malformed declarations and unresolvable imports are all recorded as
//! [`Warning`] values and handed to the consumer, who decides what is fatal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::SourceRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable machine-readable warning codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningCode {
    /// The parser rejected the file.
    ParseError,
    /// No parser is registered for the file's extension.
    UnknownFileType,
    /// An import specifier could not be mapped to a URL.
    CouldNotResolve,
    /// An import resolved to a URL the loader could not fetch.
    CouldNotLoad,
    /// A property declaration the scanner could not interpret.
    MalformedProperty,
    /// A custom element tag name that is not a valid custom element name.
    InvalidElementName,
    /// A dynamic `import()` whose target is not a string literal.
    UnsupportedDynamicImport,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCode::ParseError => "parse-error",
            WarningCode::UnknownFileType => "unknown-file-type",
            WarningCode::CouldNotResolve => "could-not-resolve",
            WarningCode::CouldNotLoad => "could-not-load",
            WarningCode::MalformedProperty => "malformed-property",
            WarningCode::InvalidElementName => "invalid-element-name",
            WarningCode::UnsupportedDynamicImport => "unsupported-dynamic-import",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub severity: Severity,
    pub code: WarningCode,
    pub message: String,
    pub source_range: SourceRange,
}

impl Warning {
    pub fn new(
        severity: Severity,
        code: WarningCode,
        message: impl Into<String>,
        source_range: SourceRange,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            source_range,
        }
    }

    pub fn error(code: WarningCode, message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(Severity::Error, code, message, range)
    }

    pub fn warning(code: WarningCode, message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(Severity::Warning, code, message, range)
    }

    pub fn info(code: WarningCode, message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(Severity::Info, code, message, range)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}[{}]: {}",
            self.source_range, self.severity, self.code, self.message
        )
    }
}
