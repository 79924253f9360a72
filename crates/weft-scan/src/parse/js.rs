//! JavaScript / TypeScript parsing via oxc.

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

use super::RawSyntaxError;

/// A parsed program plus every diagnostic the parser produced.
///
/// oxc recovers from many errors and still returns a program; callers must
/// treat a non-empty `errors` list as a failed parse.
pub struct JsParse<'a> {
    pub program: Program<'a>,
    pub errors: Vec<RawSyntaxError>,
}

/// Source type for a file name, falling back to an ES module.
pub fn source_type_for(file_name: &str) -> SourceType {
    SourceType::from_path(file_name).unwrap_or_else(|_| SourceType::mjs())
}

pub fn parse_js<'a>(allocator: &'a Allocator, source: &'a str, source_type: SourceType) -> JsParse<'a> {
    let parser_return = Parser::new(allocator, source, source_type).parse();

    let mut errors: Vec<RawSyntaxError> = parser_return
        .errors
        .iter()
        .map(|error| {
            let offset = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset())
                .unwrap_or(0);
            RawSyntaxError::new(error.to_string(), offset)
        })
        .collect();

    if parser_return.panicked && errors.is_empty() {
        errors.push(RawSyntaxError::new("parser aborted", 0));
    }

    JsParse {
        program: parser_return.program,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modules() {
        let allocator = Allocator::default();
        let parsed = parse_js(
            &allocator,
            "import './a.js';\nexport class A extends HTMLElement {}",
            SourceType::mjs(),
        );
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.program.body.len(), 2);
    }

    #[test]
    fn reports_errors_with_offsets() {
        let allocator = Allocator::default();
        let source = "const ok = 1;\nclass {";
        let parsed = parse_js(&allocator, source, SourceType::mjs());
        assert!(!parsed.errors.is_empty());
        assert!(parsed.errors[0].offset as usize >= "const ok = 1;\n".len());
    }

    #[test]
    fn source_type_follows_extension() {
        assert!(source_type_for("a.ts").is_typescript());
        assert!(source_type_for("a.mjs").is_module());
        assert!(source_type_for("weird.html").is_module());
    }
}
