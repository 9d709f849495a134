use std::sync::OnceLock;

use lc_core::LexError;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    Identifier,
    Integer,
    FloatFixed,
    FloatScientific,
    Str,
    Power,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Concat,
    NotEqual,
    Equal,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Range,
    Keyword,
    Bareword,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

impl Token {
    pub fn string_body(&self) -> Option<&str> {
        if self.kind != TokenKind::Str || self.text.len() < 2 {
            return None;
        }
        Some(&self.text[1..self.text.len() - 1])
    }

    pub fn sigil(&self) -> Option<char> {
        match self.kind {
            TokenKind::Identifier => self.text.chars().next(),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct LexRule {
    kind: TokenKind,
    name: &'static str,
    pattern: Regex,
    line_start_only: bool,
}

impl LexRule {
    pub(crate) fn new(kind: TokenKind, name: &'static str, pattern: &str) -> Self {
        Self {
            kind,
            name,
            pattern: Regex::new(&format!(r"\A(?:{})", pattern)).expect("lexer rule must compile"),
            line_start_only: false,
        }
    }

    fn at_line_start(mut self) -> Self {
        self.line_start_only = true;
        self
    }
}

fn rules() -> &'static [LexRule] {
    static RULES: OnceLock<Vec<LexRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        use TokenKind::*;
        vec![
            LexRule::new(Whitespace, "whitespace", r"\s+"),
            LexRule::new(Identifier, "identifier", r"[$@&][A-Za-z_][A-Za-z0-9_]*"),
            LexRule::new(Integer, "integer", r"[+-]?[0-9][0-9_]*"),
            LexRule::new(FloatFixed, "float", r"[+-]?(?:[0-9]+\.[0-9]+|\.[0-9]+)"),
            LexRule::new(
                FloatScientific,
                "scientific",
                r"[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)[Ee][+-]?[0-9]+",
            ),
            LexRule::new(Power, "**", r"\*\*"),
            LexRule::new(Plus, "+", r"\+"),
            LexRule::new(Minus, "-", r"-"),
            LexRule::new(Star, "*", r"\*"),
            LexRule::new(Slash, "/", r"/"),
            LexRule::new(Percent, "%", r"%"),
            LexRule::new(Assign, "=", r"="),
            LexRule::new(Concat, ".", r"\."),
            LexRule::new(NotEqual, "!=", r"!="),
            LexRule::new(Equal, "==", r"=="),
            LexRule::new(Less, "<", r"<"),
            LexRule::new(Greater, ">", r">"),
            LexRule::new(LessEqual, "<=", r"<="),
            LexRule::new(GreaterEqual, ">=", r">="),
            LexRule::new(And, "&&", r"&&"),
            LexRule::new(Or, "||", r"\|\|"),
            LexRule::new(Not, "!", r"!"),
            LexRule::new(LeftParen, "(", r"\("),
            LexRule::new(RightParen, ")", r"\)"),
            LexRule::new(LeftBracket, "[", r"\["),
            LexRule::new(RightBracket, "]", r"\]"),
            LexRule::new(LeftBrace, "{", r"\{"),
            LexRule::new(RightBrace, "}", r"\}"),
            LexRule::new(Comma, ",", r","),
            LexRule::new(Semicolon, ";", r";"),
            LexRule::new(Range, "..", r"\.\."),
            LexRule::new(Keyword, "keyword", r"(?:my|if|elsif|else)\b"),
            LexRule::new(Bareword, "bareword", r"[A-Za-z_][A-Za-z0-9_]*"),
            LexRule::new(LineComment, "line comment", r"#[^\n]*\n?"),
            LexRule::new(BlockComment, "block comment", r"(?s:=.*?=cut[^\n]*)").at_line_start(),
        ]
    })
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    tokenize_with(source, rules())
}

// Longest match wins; ties go to the earlier rule.
pub(crate) fn tokenize_with(source: &str, rules: &[LexRule]) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while cursor < source.len() {
        let rest = &source[cursor..];

        if rest.starts_with(['"', '\'']) {
            let end = scan_string(source, cursor)?;
            tokens.push(Token {
                kind: TokenKind::Str,
                text: source[cursor..end].to_string(),
                offset: cursor,
            });
            cursor = end;
            continue;
        }

        let at_line_start = cursor == 0 || source[..cursor].ends_with('\n');
        let mut best: Option<(&LexRule, usize)> = None;
        for rule in rules {
            if rule.line_start_only && !at_line_start {
                continue;
            }
            let Some(found) = rule.pattern.find(rest) else {
                continue;
            };
            if found.end() == 0 {
                return Err(LexError::EmptyMatch {
                    rule: rule.name,
                    offset: cursor,
                });
            }
            if best.map_or(true, |(_, len)| found.end() > len) {
                best = Some((rule, found.end()));
            }
        }

        let Some((rule, len)) = best else {
            return Err(LexError::NoRuleMatches {
                offset: cursor,
                snippet: rest.chars().take(16).collect(),
            });
        };

        if rule.kind != TokenKind::Whitespace {
            tokens.push(Token {
                kind: rule.kind,
                text: rest[..len].to_string(),
                offset: cursor,
            });
        }
        cursor += len;
    }

    Ok(tokens)
}

fn scan_string(source: &str, start: usize) -> Result<usize, LexError> {
    let delimiter = source[start..]
        .chars()
        .next()
        .ok_or(LexError::UnterminatedString { offset: start })?;
    let body_start = start + delimiter.len_utf8();
    let mut chars = source[body_start..].char_indices();
    while let Some((index, ch)) = chars.next() {
        if ch == '\\' {
            if chars.next().is_none() {
                break;
            }
            continue;
        }
        if ch == delimiter {
            return Ok(body_start + index + ch.len_utf8());
        }
    }
    Err(LexError::UnterminatedString { offset: start })
}

pub(crate) fn is_numeric_literal(text: &str) -> bool {
    rules()
        .iter()
        .filter(|rule| {
            matches!(
                rule.kind,
                TokenKind::Integer | TokenKind::FloatFixed | TokenKind::FloatScientific
            )
        })
        .any(|rule| {
            rule.pattern
                .find(text)
                .is_some_and(|found| found.end() == text.len() && !text.is_empty())
        })
}
