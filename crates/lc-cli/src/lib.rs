use std::ffi::OsString;

use clap::Parser;
use lc_core::ConvertError;

mod cli_args;
mod convert;
mod error_map;
mod logging;
mod source_loader;

pub(crate) use cli_args::{Cli, ConvertArgs, Mode, TranslateArgs};
pub(crate) use error_map::{
    emit_error, map_cli_output_json, map_cli_output_write, map_cli_source_path,
    map_cli_source_read,
};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    logging::setup_logging(cli.verbose, cli.quiet);
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(code = error.code(), "{}", error);
            emit_error(&error)
        }
    }
}

fn run(cli: Cli) -> Result<i32, ConvertError> {
    match cli.command {
        Mode::Convert(args) => convert::run_convert(args),
        Mode::Translate(args) => convert::run_translate(args),
    }
}
