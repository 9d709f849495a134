use std::sync::OnceLock;

use regex::Regex;

pub fn scalar_symbol(name: &str) -> String {
    format!("scalar_{}", name)
}

pub fn vector_symbol(name: &str) -> String {
    format!("vector_{}", name)
}

pub fn builtin_symbol(name: &str) -> String {
    format!("builtin_{}", name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementIndex<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InlineReference<'a> {
    Element {
        array: &'a str,
        index: ElementIndex<'a>,
        len: usize,
    },
    Scalar {
        name: &'a str,
        len: usize,
    },
}

impl InlineReference<'_> {
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Element { len, .. } | Self::Scalar { len, .. } => *len,
        }
    }
}

pub(crate) fn match_reference(text: &str) -> Option<InlineReference<'_>> {
    if let Some(captures) = element_regex().captures(text) {
        let whole = captures.get(0)?;
        let array = captures.get(1)?.as_str();
        let index = match (captures.get(2), captures.get(3)) {
            (Some(variable), _) => ElementIndex::Variable(variable.as_str()),
            (None, Some(digits)) => ElementIndex::Literal(digits.as_str()),
            (None, None) => return None,
        };
        return Some(InlineReference::Element {
            array,
            index,
            len: whole.end(),
        });
    }
    let captures = scalar_regex().captures(text)?;
    Some(InlineReference::Scalar {
        name: captures.get(1)?.as_str(),
        len: captures.get(0)?.end(),
    })
}

pub(crate) fn normalize_index(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

fn element_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)\[(?:\$([A-Za-z_][A-Za-z0-9_]*)|([0-9]+))\]")
            .expect("element regex")
    })
}

fn scalar_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)").expect("scalar regex"))
}
