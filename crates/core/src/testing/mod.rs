//! Testing utilities and mock implementations.
//!
//! Mocks stand in for every external collaborator (listing pages, the
//! details endpoint, SteamCMD) so the whole sync flow can run against a
//! temporary directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use workshop_sync_core::testing::{fixtures, MockDetailsApi, MockFetchTool};
//!
//! let details = MockDetailsApi::new();
//! details.set_time_updated(&fixtures::id("1234567"), 200).await;
//!
//! let tool = MockFetchTool::new(steamcmd_root);
//! tool.fail_item(&fixtures::id("7654321")).await;
//! ```

mod mock_details_api;
mod mock_fetch_tool;
mod mock_listing_source;

pub use mock_details_api::MockDetailsApi;
pub use mock_fetch_tool::{MockFetchTool, RecordedRun};
pub use mock_listing_source::MockListingSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::catalog::{Catalog, ItemId};
    use crate::presence::ContentLayout;

    /// Parse an id, panicking on bad input.
    pub fn id(raw: &str) -> ItemId {
        ItemId::parse(raw).unwrap_or_else(|| panic!("bad test id {:?}", raw))
    }

    pub fn catalog(ids: &[&str]) -> Catalog {
        Catalog::from_ids(ids.iter().map(|s| id(s)))
    }

    /// A listing page body carrying the given ids as data attributes.
    pub fn listing_page(ids: &[&str]) -> String {
        let items: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<div class="workshopItem"><a href="https://steamcommunity.com/sharedfiles/filedetails/?id={id}" data-publishedfileid="{id}"></a></div>"#
                )
            })
            .collect();
        format!("<html><body>{}</body></html>", items)
    }

    /// Render an `appworkshop_<app>.acf` state file.
    pub fn render_acf(app_id: &str, entries: &[(ItemId, u64)]) -> String {
        let mut out = format!(
            "\"AppWorkshop\"\n{{\n\t\"appid\"\t\t\"{}\"\n\t\"WorkshopItemsInstalled\"\n\t{{\n",
            app_id
        );
        for (id, updated) in entries {
            out.push_str(&format!(
                "\t\t\"{}\"\n\t\t{{\n\t\t\t\"size\"\t\t\"1024\"\n\t\t\t\"timeupdated\"\t\t\"{}\"\n\t\t\t\"manifest\"\t\t\"42\"\n\t\t}}\n",
                id, updated
            ));
        }
        out.push_str("\t}\n}\n");
        out
    }

    /// Write the state file for `layout`, replacing any existing one.
    pub fn write_state(layout: &ContentLayout, entries: &[(ItemId, u64)]) {
        let path = layout.state_file();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create state dir");
        }
        std::fs::write(path, render_acf(layout.app_id(), entries)).expect("write state file");
    }

    /// Put a non-empty file into the item's content folder.
    pub fn write_content(layout: &ContentLayout, id: &ItemId) {
        let dir = layout.item_dir(id);
        std::fs::create_dir_all(&dir).expect("create content dir");
        std::fs::write(dir.join("About.xml"), b"<mod/>").expect("write content file");
    }

    /// Create the item's content folder with nothing useful in it.
    pub fn write_empty_content(layout: &ContentLayout, id: &ItemId) {
        let dir = layout.item_dir(id);
        std::fs::create_dir_all(&dir).expect("create content dir");
        std::fs::write(dir.join("empty.txt"), b"").expect("write empty file");
    }

    pub fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .expect("read list file")
            .lines()
            .map(str::to_string)
            .collect()
    }
}
