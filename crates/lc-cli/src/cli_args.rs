use clap::{Args, Parser, Subcommand, ValueEnum};
use lc_api::{DedupPolicy, TranslateOptions, VisibilityMode};

#[derive(Debug, Parser)]
#[command(name = "lc-migrate")]
#[command(about = "Converts legacy problem documents into templated markup and scripts")]
pub(crate) struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    /// Only log errors.
    #[arg(long = "quiet", global = true)]
    pub(crate) quiet: bool,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Convert(ConvertArgs),
    Translate(TranslateArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ConvertArgs {
    #[arg(long = "source-dir")]
    pub(crate) source_dir: String,
    #[arg(long = "out-dir")]
    pub(crate) out_dir: String,
    #[command(flatten)]
    pub(crate) options: OptionArgs,
}

#[derive(Debug, Args)]
pub(crate) struct TranslateArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
    #[command(flatten)]
    pub(crate) options: OptionArgs,
}

#[derive(Debug, Args)]
pub(crate) struct OptionArgs {
    #[arg(long = "seed", default_value_t = lc_api::DEFAULT_RANDOM_SEED)]
    pub(crate) seed: u32,
    #[arg(long = "dedup", value_enum, default_value_t = DedupArg::Global)]
    pub(crate) dedup: DedupArg,
    #[arg(long = "visibility", value_enum, default_value_t = VisibilityArg::Execute)]
    pub(crate) visibility: VisibilityArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DedupArg {
    Global,
    PerScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum VisibilityArg {
    Execute,
    StaticScan,
}

impl OptionArgs {
    pub(crate) fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            random_seed: self.seed,
            dedup: match self.dedup {
                DedupArg::Global => DedupPolicy::Global,
                DedupArg::PerScope => DedupPolicy::PerScope,
            },
            visibility: match self.visibility {
                VisibilityArg::Execute => VisibilityMode::Execute,
                VisibilityArg::StaticScan => VisibilityMode::StaticScan,
            },
        }
    }
}
