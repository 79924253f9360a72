//! CSS parsing via lightningcss.

use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use weft_core::LineIndex;

use super::RawSyntaxError;

pub fn parse_css<'a>(source: &'a str, filename: &str) -> Result<StyleSheet<'a>, RawSyntaxError> {
    StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..Default::default()
        },
    )
    .map_err(|error| {
        // lightningcss lines are zero-based, columns one-based
        let offset = error
            .loc
            .as_ref()
            .map(|loc| LineIndex::new(source).offset(loc.line, loc.column.saturating_sub(1)))
            .unwrap_or(0);
        RawSyntaxError {
            message: error.kind.to_string(),
            offset,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightningcss::rules::CssRule;

    #[test]
    fn keeps_import_rules() {
        let sheet = parse_css("@import url('a.css');\n:host { display: block; }", "x.css").unwrap();
        assert!(matches!(sheet.rules.0.first(), Some(CssRule::Import(_))));
    }

    #[test]
    fn rejects_broken_stylesheets() {
        assert!(parse_css("..bad { color: red; }", "x.css").is_err());
    }
}
