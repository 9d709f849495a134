use std::fs;
use std::path::{Path, PathBuf};

use lc_api::{translate_problem, TranslateOptions, TranslatedProblem};
use lc_core::ConvertError;
use tracing::{error, info, warn};

use crate::source_loader::{find_problem_files, read_problem_source, resolve_source_dir, ProblemFile};
use crate::{map_cli_output_json, map_cli_output_write, ConvertArgs, TranslateArgs};

pub(crate) const DATA_FILE: &str = "data.json";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ConvertSummary {
    pub(crate) converted: usize,
    pub(crate) skipped: usize,
    pub(crate) failed: usize,
}

pub(crate) fn run_convert(args: ConvertArgs) -> Result<i32, ConvertError> {
    let source_root = resolve_source_dir(&args.source_dir)?;
    let out_root = PathBuf::from(&args.out_dir);
    fs::create_dir_all(&out_root).map_err(map_cli_output_write)?;
    let options = args.options.translate_options();

    let problems = find_problem_files(&source_root);
    if problems.is_empty() {
        warn!(source = %source_root.display(), "no .problem files found");
    }

    let summary = convert_all(&problems, &out_root, &options);
    println!("CONVERTED:{}", summary.converted);
    println!("SKIPPED:{}", summary.skipped);
    println!("FAILED:{}", summary.failed);
    if summary.failed > 0 {
        println!("RESULT:PARTIAL");
        return Ok(1);
    }
    println!("RESULT:OK");
    Ok(0)
}

pub(crate) fn convert_all(
    problems: &[ProblemFile],
    out_root: &Path,
    options: &TranslateOptions,
) -> ConvertSummary {
    let mut summary = ConvertSummary::default();
    for problem in problems {
        match convert_one(problem, out_root, options) {
            Ok(path) => {
                info!(problem = %problem.name, output = %path.display(), "converted");
                println!("PROBLEM_OK:{}", problem.name);
                summary.converted += 1;
            }
            Err(cause) if cause.is_tolerable() => {
                warn!(problem = %problem.name, code = cause.code(), "skipped: {}", cause);
                println!("PROBLEM_SKIPPED:{}:{}", problem.name, cause.code());
                summary.skipped += 1;
            }
            Err(cause) => {
                error!(problem = %problem.name, code = cause.code(), "failed: {}", cause);
                println!("PROBLEM_FAILED:{}:{}", problem.name, cause.code());
                summary.failed += 1;
            }
        }
    }
    summary
}

fn convert_one(
    problem: &ProblemFile,
    out_root: &Path,
    options: &TranslateOptions,
) -> Result<PathBuf, ConvertError> {
    let source = read_problem_source(&problem.path)?;
    let translated = translate_problem(&source, options)?;
    write_output(out_root, &problem.name, &translated)
}

pub(crate) fn write_output(
    out_root: &Path,
    name: &str,
    translated: &TranslatedProblem,
) -> Result<PathBuf, ConvertError> {
    let directory = out_root.join(name);
    fs::create_dir_all(&directory).map_err(map_cli_output_write)?;
    let path = directory.join(DATA_FILE);
    let json = serde_json::to_string_pretty(translated).map_err(map_cli_output_json)?;
    fs::write(&path, json).map_err(map_cli_output_write)?;
    Ok(path)
}

pub(crate) fn run_translate(args: TranslateArgs) -> Result<i32, ConvertError> {
    let source = read_problem_source(Path::new(&args.file))?;
    let translated = translate_problem(&source, &args.options.translate_options())?;
    let json = serde_json::to_string(&translated).map_err(map_cli_output_json)?;
    println!("RESULT:OK");
    println!("DATA_JSON:{}", json);
    Ok(0)
}
