//! Installed-state parsing.
//!
//! SteamCMD records installed Workshop items in an `appworkshop_<app>.acf`
//! file, a brace-delimited key/value format:
//!
//! ```text
//! "AppWorkshop"
//! {
//!     "appid"        "294100"
//!     "WorkshopItemsInstalled"
//!     {
//!         "1234567"
//!         {
//!             "size"          "1048576"
//!             "timeupdated"   "1690000000"
//!         }
//!     }
//! }
//! ```
//!
//! The grammar is undocumented, so this is a tolerant block scanner rather
//! than a parser: a block starts at a quoted key of at least six digits
//! followed by `{` and ends at the first `}`. Only blocks carrying a
//! `timeupdated` field are recorded.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::catalog::ItemId;

/// Installed item id -> last updated timestamp (epoch seconds, 0 = unknown).
pub type InstalledRecord = HashMap<ItemId, u64>;

static ITEM_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""\s*(\d{6,})\s*"\s*\{([^}]*)\}"#).expect("item block pattern is valid")
});

static TIME_UPDATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"\s*timeupdated\s*"\s*"([^"]*)""#).expect("timeupdated pattern is valid")
});

/// Parse the text of a state file.
///
/// Malformed timestamps are recorded as 0. When an id appears in more than
/// one block the later block wins.
pub fn parse_installed_state(text: &str) -> InstalledRecord {
    let mut installed = InstalledRecord::new();

    for caps in ITEM_BLOCK.captures_iter(text) {
        let (Some(key), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(id) = ItemId::parse(key.as_str()) else {
            continue;
        };
        let Some(field) = TIME_UPDATED.captures(body.as_str()) else {
            continue;
        };

        let raw = field.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let updated = raw.parse::<u64>().unwrap_or_else(|_| {
            debug!(item = %id, value = raw, "Unparseable timeupdated, treating as 0");
            0
        });
        installed.insert(id, updated);
    }

    installed
}

/// Read and parse a state file. A missing or unreadable file is an empty map.
pub fn read_installed_state(path: &Path) -> InstalledRecord {
    match std::fs::read(path) {
        Ok(bytes) => {
            let installed = parse_installed_state(&String::from_utf8_lossy(&bytes));
            debug!(path = %path.display(), items = installed.len(), "Read installed state");
            installed
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No installed state file");
            InstalledRecord::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read installed state");
            InstalledRecord::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(s: &str) -> ItemId {
        ItemId::parse(s).unwrap()
    }

    const SAMPLE: &str = r#"
"AppWorkshop"
{
	"appid"		"294100"
	"SizeOnDisk"		"73400320"
	"NeedsUpdate"		"0"
	"TimeLastUpdated"		"1700000000"
	"WorkshopItemsInstalled"
	{
		"1234567"
		{
			"size"		"1048576"
			"timeupdated"		"1690000000"
			"manifest"		"8812377771928312"
		}
		"7654321"
		{
			"size"		"2048"
			"timeupdated"		"1600000000"
			"manifest"		"1"
		}
	}
	"WorkshopItemDetails"
	{
		"1234567"
		{
			"manifest"		"8812377771928312"
			"timeupdated"		"1690000500"
			"timetouched"		"1700000000"
			"subscribedby"		"76561190000000000"
		}
	}
}
"#;

    #[test]
    fn test_parse_sample_state() {
        let installed = parse_installed_state(SAMPLE);
        assert_eq!(installed.len(), 2);
        // Later block wins for duplicated ids
        assert_eq!(installed[&id("1234567")], 1_690_000_500);
        assert_eq!(installed[&id("7654321")], 1_600_000_000);
    }

    #[test]
    fn test_short_numeric_keys_ignored() {
        let text = r#"
"12345"
{
    "timeupdated" "100"
}
"123456"
{
    "timeupdated" "200"
}
"#;
        let installed = parse_installed_state(text);
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[&id("123456")], 200);
    }

    #[test]
    fn test_block_without_timeupdated_skipped() {
        let text = r#"
"1111111"
{
    "size" "10"
}
"2222222"
{
    "TimeUpdated" "5"
}
"#;
        let installed = parse_installed_state(text);
        assert!(!installed.contains_key(&id("1111111")));
        assert_eq!(installed[&id("2222222")], 5);
    }

    #[test]
    fn test_malformed_timestamp_defaults_to_zero() {
        let text = r#"
"3333333"
{
    "timeupdated" "soon"
}
"4444444"
{
    "timeupdated" ""
}
"#;
        let installed = parse_installed_state(text);
        assert_eq!(installed[&id("3333333")], 0);
        assert_eq!(installed[&id("4444444")], 0);
    }

    #[test]
    fn test_block_ends_at_first_closing_brace() {
        // The nested block closes the scan; the trailing timeupdated belongs
        // to no recognised block.
        let text = r#"
"5555555"
{
    "nested" { "x" "y" }
    "timeupdated" "77"
}
"#;
        let installed = parse_installed_state(text);
        assert!(installed.is_empty());
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(parse_installed_state("").is_empty());
        assert!(parse_installed_state("{{{ not acf }}}").is_empty());
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let installed = read_installed_state(&dir.path().join("appworkshop_1.acf"));
        assert!(installed.is_empty());
    }

    #[test]
    fn test_read_state_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("appworkshop_294100.acf");
        std::fs::write(&path, SAMPLE).unwrap();
        let installed = read_installed_state(&path);
        assert_eq!(installed.len(), 2);
    }
}
