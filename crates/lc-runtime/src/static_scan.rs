use std::collections::BTreeSet;
use std::sync::OnceLock;

use lc_core::{ConvertError, ScopeScript};
use regex::Regex;

use crate::evaluator::BindingProbe;

#[derive(Debug, Default, Clone, Copy)]
pub struct StaticScan;

impl BindingProbe for StaticScan {
    fn top_level_bindings(&self, scripts: &[ScopeScript]) -> Result<BTreeSet<String>, ConvertError> {
        let mut names = BTreeSet::new();
        for entry in scripts {
            collect_top_level_lets(&entry.script, &mut names);
        }
        Ok(names)
    }
}

fn collect_top_level_lets(script: &str, names: &mut BTreeSet<String>) {
    let sanitized = sanitize_script(script);
    let mut depth = 0usize;
    for statement in sanitized.split([';', '\n']) {
        if depth == 0 {
            if let Some(captures) = let_regex().captures(statement) {
                names.insert(captures[1].to_string());
            }
        }
        for ch in statement.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }
}

fn sanitize_script(source: &str) -> String {
    let without_line_comments = line_comment_regex().replace_all(source, " ");
    double_quote_regex()
        .replace_all(&without_line_comments, "\"\"")
        .into_owned()
}

fn let_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:\}\s*)*let\s+([A-Za-z_][A-Za-z0-9_]*)").expect("let regex")
    })
}

fn line_comment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"//[^\n]*").expect("line comment regex"))
}

fn double_quote_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#""(?:\\.|[^"\\])*""#).expect("double quote regex"))
}
