//! On-disk presence of Workshop content.
//!
//! Presence is checked independently of the installed-state file: an item
//! counts as present only if its content folder exists and holds at least
//! one non-empty file somewhere below it.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog::ItemId;

/// Where SteamCMD keeps state and content for one app scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLayout {
    root: PathBuf,
    app_id: String,
}

impl ContentLayout {
    /// `root` is the SteamCMD folder (the one containing `steamapps`).
    pub fn new(root: impl Into<PathBuf>, app_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            app_id: app_id.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    fn workshop_dir(&self) -> PathBuf {
        self.root.join("steamapps").join("workshop")
    }

    /// `<root>/steamapps/workshop/appworkshop_<app>.acf`
    pub fn state_file(&self) -> PathBuf {
        self.workshop_dir()
            .join(format!("appworkshop_{}.acf", self.app_id))
    }

    /// `<root>/steamapps/workshop/content/<app>`
    pub fn content_dir(&self) -> PathBuf {
        self.workshop_dir().join("content").join(&self.app_id)
    }

    pub fn item_dir(&self, id: &ItemId) -> PathBuf {
        self.content_dir().join(id.as_str())
    }
}

/// True if `path` is a directory containing a non-empty file at any depth.
pub fn folder_has_content(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }

    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .any(|e| e.metadata().map(|m| m.len() > 0).unwrap_or(false))
}

/// Answers "is this item's content on disk?".
pub trait PresenceProbe {
    fn has_content(&self, id: &ItemId) -> bool;
}

/// Filesystem-backed probe over a [`ContentLayout`].
#[derive(Debug, Clone)]
pub struct FsPresence {
    layout: ContentLayout,
}

impl FsPresence {
    pub fn new(layout: ContentLayout) -> Self {
        Self { layout }
    }
}

impl PresenceProbe for FsPresence {
    fn has_content(&self, id: &ItemId) -> bool {
        folder_has_content(&self.layout.item_dir(id))
    }
}

impl<F> PresenceProbe for F
where
    F: Fn(&ItemId) -> bool,
{
    fn has_content(&self, id: &ItemId) -> bool {
        self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = ContentLayout::new("/opt/steamcmd", "294100");
        assert_eq!(
            layout.state_file(),
            PathBuf::from("/opt/steamcmd/steamapps/workshop/appworkshop_294100.acf")
        );
        let id = ItemId::parse("1234567").unwrap();
        assert_eq!(
            layout.item_dir(&id),
            PathBuf::from("/opt/steamcmd/steamapps/workshop/content/294100/1234567")
        );
    }

    #[test]
    fn test_missing_folder_has_no_content() {
        let dir = TempDir::new().unwrap();
        assert!(!folder_has_content(&dir.path().join("nope")));
    }

    #[test]
    fn test_empty_files_do_not_count() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("empty.bin"), b"").unwrap();
        assert!(!folder_has_content(dir.path()));
    }

    #[test]
    fn test_nested_nonempty_file_counts() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("mod.pak"), b"data").unwrap();
        assert!(folder_has_content(dir.path()));
    }

    #[test]
    fn test_file_path_is_not_a_folder() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("item");
        std::fs::write(&file, b"data").unwrap();
        assert!(!folder_has_content(&file));
    }

    #[test]
    fn test_fs_presence_probe() {
        let dir = TempDir::new().unwrap();
        let layout = ContentLayout::new(dir.path(), "42");
        let present = ItemId::parse("1000001").unwrap();
        let absent = ItemId::parse("1000002").unwrap();

        let item_dir = layout.item_dir(&present);
        std::fs::create_dir_all(&item_dir).unwrap();
        std::fs::write(item_dir.join("file.txt"), b"x").unwrap();

        let probe = FsPresence::new(layout);
        assert!(probe.has_content(&present));
        assert!(!probe.has_content(&absent));
    }
}
