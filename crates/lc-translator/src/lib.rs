mod context;
mod lexer;
mod reduce;
mod reference;
mod rewrite;
mod template;
mod walker;

pub use context::TranslationContext;
pub use lexer::{tokenize, Token, TokenKind};
pub use reduce::reduce_embedded_exprs;
pub use reference::{builtin_symbol, scalar_symbol, vector_symbol};
pub use rewrite::{rewrite, translate_script};
pub use walker::{walk_document, ElementRole, WalkOutput};

use lc_core::DedupPolicy;
use lc_runtime::DEFAULT_RANDOM_SEED;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityMode {
    #[default]
    Execute,
    StaticScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateOptions {
    pub random_seed: u32,
    pub dedup: DedupPolicy,
    pub visibility: VisibilityMode,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            random_seed: DEFAULT_RANDOM_SEED,
            dedup: DedupPolicy::default(),
            visibility: VisibilityMode::default(),
        }
    }
}

#[cfg(test)]
mod tests;
