//! Per-language parsers.
//!
//! Each parser is a pure function of its input text. Errors are reported
//! as [`RawSyntaxError`]s carrying a byte offset into that text; the scan
//! pipeline maps them onto the containing file.

pub mod css;
pub mod html;
pub mod js;

use lightningcss::stylesheet::StyleSheet;
use oxc_ast::ast::Program;

pub use css::parse_css;
pub use html::{HtmlAttribute, HtmlDocument, HtmlElement, TextSpan, parse_html};
pub use js::{JsParse, parse_js};

/// A parse error positioned by byte offset into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSyntaxError {
    pub message: String,
    pub offset: u32,
}

impl RawSyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: offset as u32,
        }
    }
}

/// A successfully parsed document handed to scanners.
///
/// `'t` is the borrow of the tree, `'a` the lifetime of the source text (and,
/// for JavaScript, of the arena the AST lives in).
#[derive(Clone, Copy)]
pub enum SyntaxTree<'t, 'a> {
    Html(&'t HtmlDocument),
    Js(&'t Program<'a>),
    Css {
        sheet: &'t StyleSheet<'a>,
        source: &'a str,
    },
    Json(&'t serde_json::Value),
}

impl std::fmt::Debug for SyntaxTree<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyntaxTree::Html(_) => "Html",
            SyntaxTree::Js(_) => "Js",
            SyntaxTree::Css { .. } => "Css",
            SyntaxTree::Json(_) => "Json",
        };
        write!(f, "SyntaxTree::{name}")
    }
}

pub fn parse_json(source: &str) -> Result<serde_json::Value, RawSyntaxError> {
    serde_json::from_str(source).map_err(|error| {
        let lines = weft_core::LineIndex::new(source);
        // serde_json positions are one-based
        let offset = lines.offset(
            (error.line() as u32).saturating_sub(1),
            (error.column() as u32).saturating_sub(1),
        );
        RawSyntaxError {
            message: error.to_string(),
            offset,
        }
    })
}
