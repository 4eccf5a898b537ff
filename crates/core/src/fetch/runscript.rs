//! SteamCMD runscript rendering.

use std::path::{Path, PathBuf};

use crate::catalog::ItemId;

use super::FetchError;

/// File name of the runscript inside the runscript folder.
pub const RUNSCRIPT_FILE: &str = "steamcmd_run.txt";

/// One batch job: a download directive per id, in order, then `quit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runscript {
    app_id: String,
    ids: Vec<ItemId>,
}

impl Runscript {
    pub fn new(app_id: impl Into<String>, ids: Vec<ItemId>) -> Self {
        Self {
            app_id: app_id.into(),
            ids,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for id in &self.ids {
            out.push_str(&format!("workshop_download_item {} {}\n", self.app_id, id));
        }
        out.push_str("quit\n");
        out
    }

    /// Write the rendered script to `<dir>/steamcmd_run.txt`, replacing any
    /// previous one.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, FetchError> {
        std::fs::create_dir_all(dir).map_err(|e| FetchError::write(dir, e))?;
        let path = dir.join(RUNSCRIPT_FILE);
        std::fs::write(&path, self.render()).map_err(|e| FetchError::write(&path, e))?;
        Ok(path)
    }
}
