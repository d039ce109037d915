use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::merge::merge_documents;
use crate::{info_time, Result, COMPILATION_FILENAME};

/// Position prefix of a downloaded filename, e.g. `[3] some article.pdf`.
/// The prefix is the sole ordering key, file contents are never inspected.
static POSITION_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d+)\]").expect("valid regex"));
/// Issue number embedded in a per-issue combined path, e.g. `Volume 4 Issue 26/...`.
static ISSUE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Issue (\d+)").expect("valid regex"));

/// What happened to one merge attempt, so "nothing to merge" and "merge
/// failed" can be told apart from success.
#[derive(Debug)]
pub enum MergeOutcome {
    Merged(PathBuf),
    /// No file in the directory matched the position-prefix pattern.
    NothingToMerge,
    /// A source file couldn't be opened. No output was written: one
    /// unreadable file drops the whole issue's merge.
    Failed { reason: String },
}

/// Combines every issue directory under `root` and then the per-issue
/// results into `Sci Rob Latest Compilation.pdf` at the top of `root`.
///
/// Runs strictly sequentially. Returns the per-issue combined files in
/// compilation order. A failed or empty issue is reported on the console
/// and excluded, it never aborts the rest of the run.
pub fn combine_downloads(root: &Path) -> Result<Vec<PathBuf>> {
    let mut issue_files = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let issue_dir = entry.path();
        match merge_issue_dir(&issue_dir)? {
            MergeOutcome::Merged(path) => issue_files.push(path),
            MergeOutcome::NothingToMerge => {
                info_time!("Nothing to combine in {}", issue_dir.display());
            }
            MergeOutcome::Failed { reason } => {
                info_time!("Skipped {}: {}", issue_dir.display(), reason);
            }
        }
    }

    // The issue number parsed from the path decides compilation order,
    // whatever order the filesystem listed the directories in. A combined
    // file without one can't be ordered and stays out of the compilation.
    issue_files.retain(|path| {
        let keep = issue_number(path).is_some();
        if !keep {
            info_time!(
                "No issue number in {}, excluding it from the compilation",
                path.display()
            );
        }
        keep
    });
    issue_files.sort_by_key(|path| issue_number(path));

    if issue_files.is_empty() {
        info_time!("No combined issues, skipping the compilation");
        return Ok(issue_files);
    }

    let compilation = root.join(COMPILATION_FILENAME);
    info_time!(
        "Combining {} issues into {}",
        issue_files.len(),
        compilation.display()
    );
    match merge_into(&issue_files, &compilation)? {
        MergeOutcome::Merged(_) => info_time!("DONE!"),
        MergeOutcome::NothingToMerge => {}
        MergeOutcome::Failed { reason } => {
            info_time!("Skipped the compilation: {}", reason);
        }
    }
    Ok(issue_files)
}

/// Merges one issue directory's `[<n>] ...` files, ascending by `<n>`,
/// into `Sci Rob <dirname>.pdf` inside that directory.
pub fn merge_issue_dir(issue_dir: &Path) -> Result<MergeOutcome> {
    let mut files: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(issue_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(position) = position_prefix(&name) {
            files.push((position, entry.path()));
        }
    }
    if files.is_empty() {
        return Ok(MergeOutcome::NothingToMerge);
    }
    files.sort_by_key(|&(position, _)| position);

    let output = issue_dir.join(issue_output_name(issue_dir));
    info_time!(
        "Combined File Number: {}, Combined Filename: {}",
        files.len(),
        output.display()
    );
    let paths: Vec<PathBuf> = files.into_iter().map(|(_, path)| path).collect();
    merge_into(&paths, &output)
}

fn merge_into(paths: &[PathBuf], output: &Path) -> Result<MergeOutcome> {
    match merge_documents(paths) {
        Ok(mut document) => {
            document.save(output)?;
            Ok(MergeOutcome::Merged(output.to_path_buf()))
        }
        Err(err) => Ok(MergeOutcome::Failed {
            reason: err.to_string(),
        }),
    }
}

/// `Volume 4 Issue 26` -> `Sci Rob Volume 4 Issue 26.pdf`
fn issue_output_name(issue_dir: &Path) -> String {
    let dir_name = issue_dir
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!("Sci Rob {dir_name}.pdf")
}

fn position_prefix(name: &str) -> Option<u32> {
    POSITION_PREFIX
        .captures(name)
        .and_then(|caps| caps[1].parse().ok())
}

fn issue_number(path: &Path) -> Option<u32> {
    ISSUE_NUMBER
        .captures(&path.to_string_lossy())
        .and_then(|caps| caps[1].parse().ok())
}
