/// One `@tag` line of a JSDoc block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocTag {
    pub name: String,
    /// The `{...}` prefix of the payload, if any.
    pub type_hint: Option<String>,
    pub description: Option<String>,
}

impl JsDocTag {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            description: None,
        }
    }

    /// First whitespace-delimited word of the description.
    pub fn first_word(&self) -> Option<&str> {
        self.description.as_deref()?.split_whitespace().next()
    }
}

/// Structured representation of a parsed JSDoc comment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JsDoc {
    /// Free text before the first tag.
    pub description: Option<String>,
    pub tags: Vec<JsDocTag>,
}

impl JsDoc {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }

    pub fn tag(&self, name: &str) -> Option<&JsDocTag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    pub fn tags_named<'d>(&'d self, name: &'d str) -> impl Iterator<Item = &'d JsDocTag> {
        self.tags.iter().filter(move |tag| tag.name == name)
    }
}

/// Parse a JSDoc block (the text between `/**` and `*/`).
///
/// Tag payloads may continue over following lines until the next tag.
pub fn parse_jsdoc(raw: &str) -> JsDoc {
    let mut description_lines = Vec::new();
    let mut tags: Vec<(String, Vec<String>)> = Vec::new();

    for line in normalize_lines(raw) {
        if let Some(rest) = line.strip_prefix('@') {
            let (tag, payload) = split_tag_payload(rest);
            if tag.is_empty() {
                continue;
            }
            tags.push((tag.to_string(), vec![payload.to_string()]));
        } else if let Some((_, payload)) = tags.last_mut() {
            payload.push(line);
        } else {
            description_lines.push(line);
        }
    }

    JsDoc {
        description: compose_text(description_lines),
        tags: tags
            .into_iter()
            .map(|(name, lines)| {
                let mut tag = JsDocTag::new(name);
                let payload = compose_text(lines).unwrap_or_default();
                let (type_hint, rest) = parse_type_and_rest(&payload);
                tag.type_hint = type_hint;
                tag.description = rest;
                tag
            })
            .collect(),
    }
}

fn normalize_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.trim().to_string()
        })
        .collect()
}

fn compose_text(lines: Vec<String>) -> Option<String> {
    let text = lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn split_tag_payload(input: &str) -> (&str, &str) {
    let mut parts = input.splitn(2, char::is_whitespace);
    let tag = parts.next().unwrap_or("");
    let payload = parts.next().unwrap_or("").trim();
    (tag, payload)
}

fn parse_type_and_rest(payload: &str) -> (Option<String>, Option<String>) {
    let trimmed = payload.trim();
    let Some(body) = trimmed.strip_prefix('{') else {
        return (None, (!trimmed.is_empty()).then(|| trimmed.to_string()));
    };

    // Types may nest braces: `{{a: string}}`.
    let mut depth = 1usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let ty = body[..idx].trim();
                    let rest = body[idx + 1..].trim();
                    return (
                        (!ty.is_empty()).then(|| ty.to_string()),
                        (!rest.is_empty()).then(|| rest.to_string()),
                    );
                }
            }
            _ => {}
        }
    }
    (None, Some(trimmed.to_string()))
}
