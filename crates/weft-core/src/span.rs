//! Source positions and ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::url::DocumentUrl;

/// A zero-based line/column position. Columns count characters, not bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Human-facing output is one-based.
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A span of text inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
    pub file: DocumentUrl,
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    pub fn new(file: DocumentUrl, start: Position, end: Position) -> Self {
        Self { file, start, end }
    }

    /// A zero-width range at the start of `file`, used for whole-file diagnostics.
    pub fn file_start(file: DocumentUrl) -> Self {
        Self::new(file, Position::default(), Position::default())
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.start)
    }
}

/// Precomputed line starts for converting byte offsets into [`Position`]s.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<u32>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = Vec::with_capacity(128);
        line_starts.push(0);
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((idx + 1) as u32);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.source.len() as u32);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.line_starts[line] as usize;
        let column = match self.source.get(line_start..offset as usize) {
            Some(prefix) => prefix.chars().count() as u32,
            None => offset - line_start as u32,
        };
        Position::new(line as u32, column)
    }

    /// Byte offset of a line/column pair, the inverse of [`LineIndex::position`].
    ///
    /// Lines past the end clamp to the last line, columns past the end of a
    /// line clamp to the line end.
    pub fn offset(&self, line: u32, column: u32) -> u32 {
        let line = (line as usize).min(self.line_starts.len() - 1);
        let start = self.line_starts[line] as usize;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| *next as usize)
            .unwrap_or(self.source.len());
        let text = &self.source[start..end];
        let within = text
            .char_indices()
            .nth(column as usize)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        (start + within) as u32
    }
}
