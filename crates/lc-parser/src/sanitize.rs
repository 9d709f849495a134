use std::sync::OnceLock;

use lc_core::ConvertError;
use regex::Regex;

const SCRIPT_CLOSE: &str = "</script>";

const HTML_ENTITIES: &[(&str, &str)] = &[
    ("nbsp", "#160"),
    ("deg", "#176"),
    ("plusmn", "#177"),
    ("micro", "#181"),
    ("times", "#215"),
    ("divide", "#247"),
    ("minus", "#8722"),
    ("rarr", "#8594"),
];

pub fn prepare_problem_source(raw: &str) -> Result<String, ConvertError> {
    if raw.contains("<html>") {
        return Err(ConvertError::UnsupportedDocument {
            reason: "html documents are not supported".to_string(),
        });
    }
    if raw.contains("<customresponse") {
        return Err(ConvertError::UnsupportedDocument {
            reason: "customresponse is not supported".to_string(),
        });
    }

    let body = xml_declaration_regex().replace(raw, "");
    let wrapped = format!("<root>{}</root>", body);
    let escaped = escape_dangling_ampersands(&wrapped);
    let scripts_escaped = escape_script_bodies(&escaped);
    Ok(stray_less_than_regex()
        .replace_all(&scripts_escaped, "&lt;$1")
        .into_owned())
}

fn escape_dangling_ampersands(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    while let Some(found) = source[cursor..].find('&') {
        let start = cursor + found;
        out.push_str(&source[cursor..start]);
        let rest = &source[start..];

        if let Some(entity) = entity_regex().find(rest) {
            out.push_str(entity.as_str());
            cursor = start + entity.end();
            continue;
        }

        if let Some(captures) = named_entity_regex().captures(rest) {
            let name = &captures[1];
            if let Some((_, code)) = HTML_ENTITIES.iter().find(|(known, _)| *known == name) {
                out.push('&');
                out.push_str(code);
                out.push(';');
                cursor = start + captures[0].len();
                continue;
            }
        }

        out.push_str("&amp;");
        cursor = start + 1;
    }
    out.push_str(&source[cursor..]);
    out
}

fn escape_script_bodies(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    while let Some(open) = script_open_regex().find_at(source, cursor) {
        out.push_str(&source[cursor..open.end()]);
        let body_start = open.end();
        let body_end = source[body_start..]
            .find(SCRIPT_CLOSE)
            .map(|offset| body_start + offset)
            .unwrap_or(source.len());

        for ch in source[body_start..body_end].chars() {
            match ch {
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                other => out.push(other),
            }
        }
        cursor = body_end;
    }
    out.push_str(&source[cursor..]);
    out
}

fn xml_declaration_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\s*<\?xml[^>]*\?>").expect("xml declaration regex"))
}

fn entity_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^&(?:amp|lt|gt|quot|apos|#[0-9]+|#x[0-9A-Fa-f]+);").expect("entity regex")
    })
}

fn named_entity_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^&([A-Za-z]+);").expect("named entity regex"))
}

fn script_open_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<script\b[^>]*>").expect("script open regex"))
}

fn stray_less_than_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<([\s=0-9])").expect("stray less-than regex"))
}
