//! Output folder conventions.
//!
//! Each app gets a scope folder `<Game> - <appid>` under the output root:
//!
//! ```text
//! output/
//!   Some Game - 294100/
//!     run_date.txt
//!     failed_ids.txt
//!     lists/{ids.txt, urls.txt, ids_titles.txt}
//!     old runs/2024-05-01/...
//! ```

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::crawler::sanitize_name;
use crate::fetch::FAILED_IDS_FILE;

pub const LISTS_DIR: &str = "lists";
pub const OLD_RUNS_DIR: &str = "old runs";
pub const RUN_DATE_FILE: &str = "run_date.txt";

static SCOPE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" - (\d+)$").expect("valid scope suffix pattern"));

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Folder name for a scope: `<Game> - <appid>`, `AppID - <appid>` when the
/// game name is unknown, or `fallback` when even the app id is.
pub fn scope_dir_name(app_name: Option<&str>, app_id: Option<&str>, fallback: &str) -> String {
    let name = app_name.map(sanitize_name).filter(|n| !n.is_empty());
    match (name, app_id) {
        (Some(name), Some(app_id)) => format!("{} - {}", name, app_id),
        (None, Some(app_id)) => format!("AppID - {}", app_id),
        _ => fallback.to_string(),
    }
}

/// App id encoded in a scope folder name.
pub fn scope_app_id(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_str()?;
    SCOPE_SUFFIX
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Scope folders directly under `root`, sorted by name. A missing root
/// yields nothing.
pub fn find_scope_dirs(root: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && scope_app_id(p).is_some())
        .collect();
    dirs.sort();
    dirs
}

/// The list files one crawl writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPaths {
    pub ids: PathBuf,
    pub urls: PathBuf,
    pub ids_titles: PathBuf,
}

impl ListPaths {
    pub fn for_scope(scope: &Path) -> Self {
        let lists = scope.join(LISTS_DIR);
        Self {
            ids: lists.join("ids.txt"),
            urls: lists.join("urls.txt"),
            ids_titles: lists.join("ids_titles.txt"),
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [&self.ids, &self.urls, &self.ids_titles]
    }
}

/// Catalog file for a scope: `lists/ids.txt`, else a legacy `ids.txt` at
/// the scope root.
pub fn catalog_path(scope: &Path) -> Option<PathBuf> {
    let current = ListPaths::for_scope(scope).ids;
    if current.is_file() {
        return Some(current);
    }
    let legacy = scope.join("ids.txt");
    legacy.is_file().then_some(legacy)
}

pub fn failure_path(scope: &Path) -> PathBuf {
    scope.join(FAILED_IDS_FILE)
}

/// Move whichever of `paths` exist into today's `old runs` folder.
///
/// Returns the archive folder, or `None` when there was nothing to move.
pub fn archive_outputs(scope: &Path, paths: &[&Path]) -> Result<Option<PathBuf>, WorkspaceError> {
    archive_outputs_on(scope, paths, Local::now().date_naive())
}

/// [`archive_outputs`] with an explicit date.
pub fn archive_outputs_on(
    scope: &Path,
    paths: &[&Path],
    date: NaiveDate,
) -> Result<Option<PathBuf>, WorkspaceError> {
    let existing: Vec<&Path> = paths.iter().copied().filter(|p| p.exists()).collect();
    if existing.is_empty() {
        return Ok(None);
    }

    let target = old_run_dir(scope, date)?;
    for path in existing {
        let Some(name) = path.file_name() else {
            continue;
        };
        let dest = target.join(name);
        std::fs::rename(path, &dest).map_err(|e| WorkspaceError::io(path, e))?;
        debug!(from = %path.display(), to = %dest.display(), "Archived list file");
    }

    info!(archive = %target.display(), "Archived previous run");
    Ok(Some(target))
}

/// Create `old runs/<date>`, or `<date> (n)` for the next free `n >= 2`.
fn old_run_dir(scope: &Path, date: NaiveDate) -> Result<PathBuf, WorkspaceError> {
    let base = scope.join(OLD_RUNS_DIR);
    std::fs::create_dir_all(&base).map_err(|e| WorkspaceError::io(&base, e))?;

    let day = date.format("%Y-%m-%d").to_string();
    let mut candidate = base.join(&day);
    let mut n = 2;
    while candidate.exists() {
        candidate = base.join(format!("{} ({})", day, n));
        n += 1;
    }

    std::fs::create_dir_all(&candidate).map_err(|e| WorkspaceError::io(&candidate, e))?;
    Ok(candidate)
}

/// Record when this scope was first used. Does nothing if already recorded.
pub fn mark_first_run(scope: &Path) -> Result<bool, WorkspaceError> {
    let marker = scope.join(RUN_DATE_FILE);
    if marker.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(scope).map_err(|e| WorkspaceError::io(scope, e))?;
    let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    std::fs::write(&marker, stamp).map_err(|e| WorkspaceError::io(&marker, e))?;
    Ok(true)
}
