//! Catalog input and list-file output.
//!
//! A catalog is a newline-delimited list of item ids, produced by a prior
//! crawl or curated by hand.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when reading or writing list files.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Catalog {
    /// Read a catalog file. A missing file is fatal: there is nothing to sync.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CatalogError::NotFound(path.to_path_buf())
            } else {
                CatalogError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Ok(Self::from_text(&String::from_utf8_lossy(&bytes)))
    }
}

/// Replace `path` with `lines` joined by newlines, creating parent folders.
pub fn write_lines<I, S>(path: &Path, lines: I) -> Result<(), CatalogError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let io_err = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let body = lines
        .into_iter()
        .map(|l| l.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(path, body).map_err(io_err)
}
