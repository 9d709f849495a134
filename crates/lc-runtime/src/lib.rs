mod bridge;
mod builtins;
mod evaluator;
mod rng;
mod static_scan;
mod verify;

pub use builtins::{format_number, pretty_print, FormatSpec};
pub use evaluator::{BindingProbe, ScriptEvaluator};
pub use static_scan::StaticScan;

pub const DEFAULT_RANDOM_SEED: u32 = 0;
