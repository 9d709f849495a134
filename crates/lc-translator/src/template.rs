use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::reference::{
    match_reference, normalize_index, scalar_symbol, vector_symbol, ElementIndex, InlineReference,
};

const FIGURE_DIRECTORY: &str = "clientFilesQuestion";

pub(crate) fn quote_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 2);
    out.push('"');
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped @ ('n' | 't' | 'r' | '\\' | '"')) => {
                    out.push('\\');
                    out.push(escaped);
                }
                Some(other) => push_plain(&mut out, other),
                None => out.push_str("\\\\"),
            },
            other => push_plain(&mut out, other),
        }
    }
    out.push('"');
    out
}

fn push_plain(out: &mut String, ch: char) {
    match ch {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        other => out.push(other),
    }
}

pub(crate) fn template_string(body: &str, known: &BTreeSet<String>) -> String {
    let mut template = String::with_capacity(body.len());
    let mut substitutions: Vec<String> = Vec::new();
    let mut cursor = 0usize;

    while cursor < body.len() {
        let rest = &body[cursor..];
        let mut chars = rest.chars();
        let Some(ch) = chars.next() else {
            break;
        };

        if ch == '\\' {
            let escaped_len = chars.next().map_or(0, char::len_utf8);
            template.push('\\');
            push_template_text(&mut template, &rest[1..1 + escaped_len]);
            cursor += 1 + escaped_len;
            continue;
        }

        if ch == '$' {
            if let Some(reference) = match_reference(rest) {
                if let Some(expr) = known_expression(&reference, known) {
                    template.push_str("{}");
                    substitutions.push(expr);
                } else {
                    push_template_text(&mut template, &rest[..reference.len()]);
                }
                cursor += reference.len();
                continue;
            }
        }

        push_template_text(&mut template, &rest[..ch.len_utf8()]);
        cursor += ch.len_utf8();
    }

    if substitutions.is_empty() {
        return quote_literal(body);
    }
    format!(
        "interpolate({}, [{}])",
        quote_literal(&template),
        substitutions.join(", ")
    )
}

fn push_template_text(template: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '{' => template.push_str("{{"),
            '}' => template.push_str("}}"),
            other => template.push(other),
        }
    }
}

fn known_expression(reference: &InlineReference<'_>, known: &BTreeSet<String>) -> Option<String> {
    match *reference {
        InlineReference::Element { array, index, .. } => {
            let vector = vector_symbol(array);
            if !known.contains(&vector) {
                return None;
            }
            let index = match index {
                ElementIndex::Literal(digits) => normalize_index(digits).to_string(),
                ElementIndex::Variable(name) => {
                    let scalar = scalar_symbol(name);
                    if !known.contains(&scalar) {
                        return None;
                    }
                    scalar
                }
            };
            Some(format!("{}[{}]", vector, index))
        }
        InlineReference::Scalar { name, .. } => {
            let scalar = scalar_symbol(name);
            known.contains(&scalar).then_some(scalar)
        }
    }
}

pub(crate) fn figure_literal(body: &str) -> String {
    let Some(file) = image_source_regex()
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|path| path.as_str().rsplit('/').next().unwrap_or(path.as_str()))
    else {
        warn!(body, "image string without a resource source; kept as text");
        return quote_literal(body);
    };
    let figure = format!(
        "<pl-figure file-name=\"{}\" directory=\"{}\"></pl-figure>",
        file, FIGURE_DIRECTORY
    );
    quote_literal(&figure)
}

pub(crate) fn is_image_markup(body: &str) -> bool {
    body.trim_start().starts_with("<img")
}

fn image_source_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"src\s*=\s*\\?"[^"]*?res/([^"\\)]+)"#).expect("image source regex")
    })
}
