use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub details: DetailsConfig,
    #[serde(default)]
    pub steamcmd: SteamCmdConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Reconciliation toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Skip items that are already installed (otherwise fetch the whole catalog).
    #[serde(default = "default_true")]
    pub skip_already_downloaded: bool,
    /// Re-fetch installed items whose remote revision is newer.
    #[serde(default = "default_true")]
    pub check_updates: bool,
    /// Only count an item as installed when its content folder holds data.
    #[serde(default = "default_true")]
    pub require_nonempty_on_disk: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            skip_already_downloaded: true,
            check_updates: true,
            require_nonempty_on_disk: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Listing crawler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Maximum pages to request (0 = unlimited).
    #[serde(default)]
    pub max_pages: u32,
    /// Delay between successful page fetches in milliseconds.
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_crawler_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Attempt an authenticated crawl when a cookie file is configured.
    #[serde(default = "default_true")]
    pub use_cookies: bool,
    /// Netscape or JSON cookie export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_path: Option<PathBuf>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            page_delay_ms: default_page_delay(),
            timeout_secs: default_crawler_timeout(),
            user_agent: default_user_agent(),
            use_cookies: true,
            cookie_path: None,
        }
    }
}

fn default_page_delay() -> u64 {
    400
}

fn default_crawler_timeout() -> u64 {
    25
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

/// Hard limit imposed by the details endpoint.
pub const MAX_DETAILS_BATCH: usize = 100;

/// Remote details endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetailsConfig {
    #[serde(default = "default_details_url")]
    pub url: String,
    /// Ids per request, at most [`MAX_DETAILS_BATCH`].
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between batches in milliseconds.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_details_timeout")]
    pub timeout_secs: u64,
}

impl Default for DetailsConfig {
    fn default() -> Self {
        Self {
            url: default_details_url(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay(),
            timeout_secs: default_details_timeout(),
        }
    }
}

fn default_details_url() -> String {
    "https://api.steampowered.com/ISteamRemoteStorage/GetPublishedFileDetails/v1/".to_string()
}

fn default_batch_size() -> usize {
    MAX_DETAILS_BATCH
}

fn default_batch_delay() -> u64 {
    250
}

fn default_details_timeout() -> u64 {
    30
}

/// SteamCMD installation layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SteamCmdConfig {
    /// Folder holding the steamcmd binary and its `steamapps` tree.
    #[serde(default = "default_steamcmd_root")]
    pub root: PathBuf,
    /// Executable override (default: `<root>/steamcmd[.exe]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// Where runscripts are written (default: `<root>/run`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runscript_dir: Option<PathBuf>,
}

impl Default for SteamCmdConfig {
    fn default() -> Self {
        Self {
            root: default_steamcmd_root(),
            executable: None,
            runscript_dir: None,
        }
    }
}

impl SteamCmdConfig {
    pub fn executable_path(&self) -> PathBuf {
        self.executable.clone().unwrap_or_else(|| {
            let name = if cfg!(windows) {
                "steamcmd.exe"
            } else {
                "steamcmd.sh"
            };
            self.root.join(name)
        })
    }

    pub fn runscript_dir(&self) -> PathBuf {
        self.runscript_dir
            .clone()
            .unwrap_or_else(|| self.root.join("run"))
    }
}

fn default_steamcmd_root() -> PathBuf {
    PathBuf::from("steamcmd")
}

/// Output folder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Parent of all `<Game> - <appid>` scope folders.
    #[serde(default = "default_output_root")]
    pub root: PathBuf,
    /// Scope folder name used when no app id could be detected.
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            fallback_name: default_fallback_name(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_fallback_name() -> String {
    "modlist".to_string()
}
