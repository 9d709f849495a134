use crate::types::SourceSpan;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },
    #[error("lexer rule {rule} matched an empty string at byte {offset}")]
    EmptyMatch { rule: &'static str, offset: usize },
    #[error("no lexer rule matches at byte {offset}: {snippet:?}")]
    NoRuleMatches { offset: usize, snippet: String },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            Self::UnterminatedString { offset }
            | Self::EmptyMatch { offset, .. }
            | Self::NoRuleMatches { offset, .. } => *offset,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    #[error("script lexing failed: {0}")]
    Lex(#[from] LexError),
    #[error("duplicate scope id \"{scope}\"")]
    DuplicateScopeId {
        scope: String,
        span: Option<SourceSpan>,
    },
    #[error("{name} is not visible in scope \"{scope}\" (text {text:?})")]
    UnresolvedReference {
        scope: String,
        name: String,
        text: String,
    },
    #[error("unsupported format specifier {pattern:?}")]
    UnsupportedFormatSpecifier { pattern: String },
    #[error("verification failed in scope \"{scope}\": {detail}")]
    VerificationFailure { scope: String, detail: String },
    #[error("xml parse failed: {message}")]
    Xml { message: String },
    #[error("invalid problem document: {message}")]
    InvalidDocument { message: String },
    #[error("unsupported problem document: {reason}")]
    UnsupportedDocument { reason: String },
    #[error("{context}: {message}")]
    Io { context: String, message: String },
}

impl ConvertError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lex(LexError::UnterminatedString { .. }) => "LEX_UNTERMINATED_STRING",
            Self::Lex(LexError::EmptyMatch { .. }) => "LEX_EMPTY_MATCH",
            Self::Lex(LexError::NoRuleMatches { .. }) => "LEX_NO_RULE",
            Self::DuplicateScopeId { .. } => "SCOPE_DUPLICATE_ID",
            Self::UnresolvedReference { .. } => "REFERENCE_UNRESOLVED",
            Self::UnsupportedFormatSpecifier { .. } => "FORMAT_UNSUPPORTED",
            Self::VerificationFailure { .. } => "VERIFY_FAILED",
            Self::Xml { .. } => "XML_PARSE_ERROR",
            Self::InvalidDocument { .. } => "DOCUMENT_INVALID",
            Self::UnsupportedDocument { .. } => "DOCUMENT_UNSUPPORTED",
            Self::Io { .. } => "IO_ERROR",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }

    pub fn is_tolerable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedDocument { .. } | Self::InvalidDocument { .. } | Self::Xml { .. }
        )
    }

    pub fn verification(scope: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::VerificationFailure {
            scope: scope.into(),
            detail: detail.into(),
        }
    }

    pub fn io(context: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Io {
            context: context.into(),
            message: error.to_string(),
        }
    }
}
