//! Mock fetch tool for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::ItemId;
use crate::fetch::{FetchError, FetchRun, FetchTool, Runscript};
use crate::presence::ContentLayout;
use crate::state::read_installed_state;

use super::fixtures;

/// Update time written for installs without a configured one.
const DEFAULT_TIME_UPDATED: u64 = 1_700_000_000;

/// A recorded tool invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub app_id: String,
    pub ids: Vec<ItemId>,
    pub script_path: PathBuf,
    /// Runscript contents as found on disk when the tool ran.
    pub script_body: String,
}

/// Mock implementation of the FetchTool trait.
///
/// Simulates SteamCMD against a temporary SteamCMD root: every requested
/// item gets a content file and an entry in the app's state file, unless
/// configured to fail.
///
/// # Example
///
/// ```rust,ignore
/// let tool = MockFetchTool::new(temp.path().join("steamcmd"));
/// tool.fail_item(&fixtures::id("2222222")).await;
/// tool.set_time_updated(&fixtures::id("1111111"), 500).await;
///
/// let report = engine.run(&catalog, "294100", &failure_path).await?;
/// assert_eq!(tool.run_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockFetchTool {
    /// SteamCMD root the simulated installs land in.
    root: PathBuf,
    /// Ids that are not installed at all.
    failing: Arc<RwLock<HashSet<ItemId>>>,
    /// Ids that get a state entry but an empty content folder.
    left_empty: Arc<RwLock<HashSet<ItemId>>>,
    /// Update time written per id.
    time_updated: Arc<RwLock<HashMap<ItemId, u64>>>,
    /// Exit code to report.
    exit_code: Arc<RwLock<i32>>,
    /// If set, checks and runs fail as if the executable were missing.
    missing_executable: Arc<RwLock<bool>>,
    /// Recorded runs.
    runs: Arc<RwLock<Vec<RecordedRun>>>,
}

impl MockFetchTool {
    /// Create a mock that installs into `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            failing: Arc::new(RwLock::new(HashSet::new())),
            left_empty: Arc::new(RwLock::new(HashSet::new())),
            time_updated: Arc::new(RwLock::new(HashMap::new())),
            exit_code: Arc::new(RwLock::new(0)),
            missing_executable: Arc::new(RwLock::new(false)),
            runs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Do not install this id.
    pub async fn fail_item(&self, id: &ItemId) {
        self.failing.write().await.insert(id.clone());
    }

    /// Record this id as installed but leave its folder without content.
    pub async fn leave_empty(&self, id: &ItemId) {
        self.left_empty.write().await.insert(id.clone());
    }

    /// Update time to record when installing this id.
    pub async fn set_time_updated(&self, id: &ItemId, time_updated: u64) {
        self.time_updated
            .write()
            .await
            .insert(id.clone(), time_updated);
    }

    pub async fn set_exit_code(&self, code: i32) {
        *self.exit_code.write().await = code;
    }

    /// Make runs fail as if the executable did not exist.
    pub async fn set_missing_executable(&self, missing: bool) {
        *self.missing_executable.write().await = missing;
    }

    /// Get all recorded runs.
    pub async fn recorded_runs(&self) -> Vec<RecordedRun> {
        self.runs.read().await.clone()
    }

    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }
}

#[async_trait]
impl FetchTool for MockFetchTool {
    fn name(&self) -> &str {
        "mock-steamcmd"
    }

    async fn check(&self) -> Result<(), FetchError> {
        if *self.missing_executable.read().await {
            return Err(FetchError::ExecutableNotFound {
                path: self.root.join("steamcmd.sh"),
            });
        }
        Ok(())
    }

    async fn run(&self, script: &Runscript, script_path: &Path) -> Result<FetchRun, FetchError> {
        self.check().await?;

        self.runs.write().await.push(RecordedRun {
            app_id: script.app_id().to_string(),
            ids: script.ids().to_vec(),
            script_path: script_path.to_path_buf(),
            script_body: std::fs::read_to_string(script_path).unwrap_or_default(),
        });

        let layout = ContentLayout::new(&self.root, script.app_id());
        let mut installed = read_installed_state(&layout.state_file());
        let failing = self.failing.read().await;
        let left_empty = self.left_empty.read().await;
        let times = self.time_updated.read().await;

        for id in script.ids() {
            if failing.contains(id) {
                continue;
            }
            if left_empty.contains(id) {
                fixtures::write_empty_content(&layout, id);
            } else {
                fixtures::write_content(&layout, id);
            }
            let updated = times.get(id).copied().unwrap_or(DEFAULT_TIME_UPDATED);
            installed.insert(id.clone(), updated);
        }

        let mut entries: Vec<(ItemId, u64)> = installed.into_iter().collect();
        entries.sort();
        fixtures::write_state(&layout, &entries);

        Ok(FetchRun {
            exit_code: Some(*self.exit_code.read().await),
        })
    }
}
