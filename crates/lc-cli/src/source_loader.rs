use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lc_core::ConvertError;
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_read};

const PROBLEM_EXTENSION: &str = "problem";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProblemFile {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
}

pub(crate) fn resolve_source_dir(source_dir: &str) -> Result<PathBuf, ConvertError> {
    let path = PathBuf::from(source_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(ConvertError::io(
            "source-dir does not exist",
            absolute.display(),
        ));
    }
    if !absolute.is_dir() {
        return Err(ConvertError::io(
            "source-dir is not a directory",
            absolute.display(),
        ));
    }
    Ok(absolute)
}

pub(crate) fn find_problem_files(source_dir: &Path) -> Vec<ProblemFile> {
    let mut by_directory: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for entry in WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(PROBLEM_EXTENSION) {
            continue;
        }
        let Some(parent) = path.parent() else {
            continue;
        };
        by_directory
            .entry(parent.to_path_buf())
            .or_insert_with(|| path.to_path_buf());
    }

    by_directory
        .into_values()
        .map(|path| ProblemFile {
            name: problem_name(&path),
            path,
        })
        .collect()
}

pub(crate) fn problem_name(path: &Path) -> String {
    let directory = path
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("problem");
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("unknown");
    format!("{}-{}", directory, stem)
}

pub(crate) fn read_problem_source(path: &Path) -> Result<String, ConvertError> {
    fs::read_to_string(path).map_err(map_cli_source_read)
}
