//! HTML start-tag tokenizer.
//!
//! Scanners only care about start tags, their attributes, and the raw text
//! of `<script>` and `<style>` elements, so this is a tokenizer rather than a
//! tree builder: it walks the input with `memchr`, records every start tag
//! in document order, and skips text, comments, doctypes and end tags.

use memchr::{memchr, memmem};

use super::RawSyntaxError;

/// A byte range inside the parsed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlAttribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Entity-decoded value, `None` for boolean attributes.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    /// Lowercased tag name.
    pub tag: String,
    pub attributes: Vec<HtmlAttribute>,
    /// The start tag, from `<` through `>`.
    pub span: TextSpan,
    /// Body of raw-text elements (`<script>`, `<style>`).
    pub raw_text: Option<TextSpan>,
}

impl HtmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr.name == name)
    }

    /// Whitespace-separated tokens of the `rel` attribute, lowercased.
    pub fn rel_tokens(&self) -> Vec<String> {
        self.attr("rel")
            .map(|rel| rel.split_ascii_whitespace().map(str::to_ascii_lowercase).collect())
            .unwrap_or_default()
    }
}

/// Start tags of an HTML document in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlDocument {
    pub elements: Vec<HtmlElement>,
}

impl HtmlDocument {
    pub fn elements_named<'d>(&'d self, tag: &'d str) -> impl Iterator<Item = &'d HtmlElement> {
        self.elements.iter().filter(move |element| element.tag == tag)
    }
}

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

pub fn parse_html(source: &str) -> Result<HtmlDocument, RawSyntaxError> {
    let bytes = source.as_bytes();
    let mut elements = Vec::new();
    let mut pos = 0usize;

    while let Some(found) = memchr(b'<', &bytes[pos..]) {
        let lt = pos + found;
        let next = bytes.get(lt + 1).copied();

        if bytes[lt + 1..].starts_with(b"!--") {
            let body = lt + 4;
            let close = memmem::find(&bytes[body..], b"-->")
                .ok_or_else(|| RawSyntaxError::new("unterminated comment", lt))?;
            pos = body + close + 3;
            continue;
        }

        match next {
            Some(b'!') | Some(b'?') | Some(b'/') => {
                let close = memchr(b'>', &bytes[lt..])
                    .ok_or_else(|| RawSyntaxError::new("unterminated tag", lt))?;
                pos = lt + close + 1;
            }
            Some(byte) if byte.is_ascii_alphabetic() => {
                let (element, after) = parse_start_tag(source, lt)?;
                elements.push(element);
                pos = after;
            }
            // A stray `<` in text.
            _ => pos = lt + 1,
        }
    }

    Ok(HtmlDocument { elements })
}

/// Parse the start tag at `lt`. Returns the element and the offset to resume from.
fn parse_start_tag(
    source: &str,
    lt: usize,
) -> Result<(HtmlElement, usize), RawSyntaxError> {
    let bytes = source.as_bytes();
    let unterminated = || RawSyntaxError::new("unterminated tag", lt);

    let name_start = lt + 1;
    let mut cursor = name_start;
    while cursor < bytes.len() && !is_tag_name_end(bytes[cursor]) {
        cursor += 1;
    }
    let tag = source[name_start..cursor].to_ascii_lowercase();

    let mut attributes = Vec::new();
    let tag_end = loop {
        cursor = skip_whitespace(bytes, cursor);
        match bytes.get(cursor) {
            None => return Err(unterminated()),
            Some(b'>') => break cursor + 1,
            Some(b'/') if bytes.get(cursor + 1) == Some(&b'>') => break cursor + 2,
            Some(b'/') => {
                cursor += 1;
                continue;
            }
            Some(_) => {}
        }

        let attr_start = cursor;
        while cursor < bytes.len() && !is_attr_name_end(bytes[cursor]) {
            cursor += 1;
        }
        let name = source[attr_start..cursor].to_ascii_lowercase();

        cursor = skip_whitespace(bytes, cursor);
        let mut value = None;
        if bytes.get(cursor) == Some(&b'=') {
            cursor = skip_whitespace(bytes, cursor + 1);
            match bytes.get(cursor) {
                None => return Err(unterminated()),
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let body = cursor + 1;
                    let close = memchr(quote, &bytes[body..]).ok_or_else(|| {
                        RawSyntaxError::new("unterminated attribute value", attr_start)
                    })?;
                    value = Some(decode_entities(&source[body..body + close]));
                    cursor = body + close + 1;
                }
                Some(_) => {
                    let body = cursor;
                    while cursor < bytes.len()
                        && !bytes[cursor].is_ascii_whitespace()
                        && bytes[cursor] != b'>'
                    {
                        cursor += 1;
                    }
                    value = Some(decode_entities(&source[body..cursor]));
                }
            }
        }

        if !name.is_empty() {
            attributes.push(HtmlAttribute { name, value });
        }
    };

    let span = TextSpan {
        start: lt as u32,
        end: tag_end as u32,
    };

    if !RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
        let element = HtmlElement {
            tag,
            attributes,
            span,
            raw_text: None,
        };
        return Ok((element, tag_end));
    }

    let (body_end, resume) = find_raw_text_end(bytes, tag_end, &tag).ok_or_else(|| {
        RawSyntaxError::new(format!("unterminated <{tag}> element"), lt)
    })?;
    let element = HtmlElement {
        tag,
        attributes,
        span,
        raw_text: Some(TextSpan {
            start: tag_end as u32,
            end: body_end as u32,
        }),
    };
    Ok((element, resume))
}

/// Find `</tag` (ASCII case-insensitive) at or after `from`.
///
/// Returns the offset of the end tag and the offset just past its `>`.
fn find_raw_text_end(bytes: &[u8], from: usize, tag: &str) -> Option<(usize, usize)> {
    let mut search = from;
    while let Some(found) = memmem::find(&bytes[search..], b"</") {
        let start = search + found;
        let name_start = start + 2;
        let name_end = name_start + tag.len();
        let matches = bytes
            .get(name_start..name_end)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()))
            && bytes
                .get(name_end)
                .is_none_or(|&byte| byte == b'>' || byte.is_ascii_whitespace() || byte == b'/');
        if matches {
            let resume = memchr(b'>', &bytes[name_end..])
                .map(|close| name_end + close + 1)
                .unwrap_or(bytes.len());
            return Some((start, resume));
        }
        search = name_start;
    }
    None
}

fn is_tag_name_end(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'>' || byte == b'/'
}

fn is_attr_name_end(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'=' || byte == b'>' || byte == b'/'
}

fn skip_whitespace(bytes: &[u8], mut cursor: usize) -> usize {
    while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
        cursor += 1;
    }
    cursor
}

fn decode_entities(raw: &str) -> String {
    if memchr(b'&', raw.as_bytes()).is_none() {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collects_start_tags_and_attributes() {
        let html = r#"<!doctype html>
<html><head>
  <link rel="import" href='x-foo.html'>
  <link REL=stylesheet href=theme.css>
</head><body unresolved>
  <x-foo bar="a &amp; b"></x-foo>
</body></html>"#;
        let doc = parse_html(html).unwrap();
        let tags: Vec<_> = doc.elements.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["html", "head", "link", "link", "body", "x-foo"]);

        let links: Vec<_> = doc.elements_named("link").collect();
        assert_eq!(links[0].attr("href"), Some("x-foo.html"));
        assert_eq!(links[0].rel_tokens(), ["import"]);
        assert_eq!(links[1].attr("href"), Some("theme.css"));
        assert_eq!(links[1].rel_tokens(), ["stylesheet"]);

        let body = &doc.elements[4];
        assert!(body.has_attr("unresolved"));
        assert_eq!(body.attr("unresolved"), Some(""));
        assert_eq!(doc.elements[5].attr("bar"), Some("a & b"));
    }

    #[test]
    fn captures_raw_text_of_scripts_and_styles() {
        let html = "<script type=\"module\">if (a < b) { x('</div>'); }</script>\n<STYLE>@import 'a.css';</style >";
        let doc = parse_html(html).unwrap();
        assert_eq!(doc.elements.len(), 2);

        let script = &doc.elements[0];
        let body = script.raw_text.unwrap();
        assert_eq!(
            &html[body.start as usize..body.end as usize],
            "if (a < b) { x('</div>'); }"
        );
        assert_eq!(script.attr("type"), Some("module"));

        let style = &doc.elements[1];
        assert_eq!(style.tag, "style");
        let body = style.raw_text.unwrap();
        assert_eq!(&html[body.start as usize..body.end as usize], "@import 'a.css';");
    }

    #[test]
    fn tags_inside_comments_are_ignored() {
        let doc = parse_html("<!-- <link rel=import href=a.html> --><p>").unwrap();
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].tag, "p");
    }

    #[test]
    fn self_closing_and_stray_angles() {
        let doc = parse_html("a < b <img src=x.png/> <br/>").unwrap();
        let tags: Vec<_> = doc.elements.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["img", "br"]);
        assert_eq!(doc.elements[0].attr("src"), Some("x.png/"));
        assert_eq!(doc.elements[1].span, TextSpan { start: 23, end: 28 });
    }

    #[test]
    fn unterminated_constructs_are_errors() {
        let err = parse_html("<p>ok</p>\n<!-- never closed").unwrap_err();
        assert_eq!(err.offset, 10);
        assert!(err.message.contains("comment"));

        let err = parse_html("<script>let a = 1;").unwrap_err();
        assert!(err.message.contains("<script>"));

        assert!(parse_html("<div class=\"x").is_err());
        assert!(parse_html("<div").is_err());
    }

    proptest! {
        #[test]
        fn never_panics(input in "([<>a-z/!\"'= \\-\n]|\\PC){0,64}") {
            let _ = parse_html(&input);
        }

        #[test]
        fn raw_text_spans_fall_on_char_boundaries(
            body in "\\PC{0,24}",
            tag in "(script|style)",
        ) {
            let input = format!("<p title=\"é\">ü</p><{tag}>{body}</{tag}>");
            if let Ok(document) = parse_html(&input) {
                for span in document.elements.iter().filter_map(|element| element.raw_text) {
                    prop_assert!(input.get(span.start as usize..span.end as usize).is_some());
                }
            }
        }
    }
}
