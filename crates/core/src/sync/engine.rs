//! The sync engine.

use std::path::Path;
use tracing::{info, warn};

use crate::catalog::{write_lines, Catalog, ItemId};
use crate::config::Config;
use crate::crawler::{is_listing_url, CrawlError, ListingCrawler, ListingSource};
use crate::details::{DetailsApi, DetailsFetcher};
use crate::fetch::{verify, write_failures, FetchTool, Runscript};
use crate::presence::{ContentLayout, FsPresence};
use crate::reconcile::{self, FetchPlan, UpdateCheck};
use crate::state::read_installed_state;
use crate::workspace::{self, ListPaths};

use super::{CrawlOutcome, SyncError, SyncReport};

/// Drives reconciliation and fetching for one configuration.
///
/// Every step runs in sequence: one page, one details batch, one
/// SteamCMD process at a time.
pub struct SyncEngine<A, F> {
    config: Config,
    details: DetailsFetcher<A>,
    tool: F,
}

impl<A, F> SyncEngine<A, F>
where
    A: DetailsApi,
    F: FetchTool,
{
    pub fn new(config: Config, details_api: A, tool: F) -> Self {
        let details = DetailsFetcher::new(details_api, &config.details);
        Self {
            config,
            details,
            tool,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tool(&self) -> &F {
        &self.tool
    }

    fn layout(&self, app_id: &str) -> ContentLayout {
        ContentLayout::new(&self.config.steamcmd.root, app_id)
    }

    /// Crawl a listing and write its lists into the scope folder.
    ///
    /// Only Steam Community Workshop URLs are accepted. Previous lists are
    /// archived first. Ids are written in numeric order with titles looked
    /// up from the details endpoint. When the crawl finds nothing, no files
    /// are touched.
    pub async fn crawl_listing<S: ListingSource>(
        &self,
        crawler: &ListingCrawler<S>,
        listing_url: &str,
    ) -> Result<CrawlOutcome, SyncError> {
        if !is_listing_url(listing_url) {
            return Err(CrawlError::InvalidUrl(listing_url.to_string()).into());
        }

        let scope = crawler.detect_scope(listing_url).await;
        let dir_name = workspace::scope_dir_name(
            scope.app_name.as_deref(),
            scope.app_id.as_deref(),
            &self.config.output.fallback_name,
        );
        let scope_dir = self.config.output.root.join(dir_name);
        info!(
            app_id = scope.app_id.as_deref().unwrap_or("unknown"),
            scope = %scope_dir.display(),
            "Crawling listing"
        );

        let report = crawler.crawl(listing_url).await?;
        if report.ids.is_empty() {
            warn!(pages = report.pages_fetched, "No items found");
            return Ok(CrawlOutcome {
                scope,
                scope_dir,
                report,
                lists: None,
                archived_to: None,
                titled: 0,
            });
        }

        workspace::mark_first_run(&scope_dir)?;
        let lists = ListPaths::for_scope(&scope_dir);
        let archived_to = workspace::archive_outputs(&scope_dir, &lists.all())?;

        let sorted: Vec<ItemId> = report.ids.iter().cloned().collect();
        let titles = self.details.titles(&sorted).await;

        write_lines(&lists.ids, sorted.iter().map(ItemId::as_str))?;
        write_lines(&lists.urls, sorted.iter().map(ItemId::details_url))?;
        write_lines(
            &lists.ids_titles,
            sorted.iter().map(|id| {
                let title = titles.get(id).map(String::as_str).unwrap_or("");
                format!("{}\t{}", id, title)
            }),
        )?;

        info!(
            items = sorted.len(),
            titled = titles.len(),
            stop = ?report.stop,
            lists = %lists.ids.display(),
            "Saved listing"
        );

        Ok(CrawlOutcome {
            scope,
            scope_dir,
            titled: titles.len(),
            report,
            lists: Some(lists),
            archived_to,
        })
    }

    /// Work out what to fetch for `catalog` without fetching anything.
    pub async fn plan(&self, catalog: &Catalog, app_id: &str) -> Result<FetchPlan, SyncError> {
        validate_app_id(app_id)?;
        let layout = self.layout(app_id);
        let installed = read_installed_state(&layout.state_file());
        let toggles = &self.config.sync;

        if !toggles.skip_already_downloaded {
            info!(items = catalog.len(), "Skipping disabled, fetching whole catalog");
            return Ok(FetchPlan::everything(catalog, installed.len()));
        }

        let probe = FsPresence::new(layout);
        let partition = reconcile::partition(&installed, &probe, toggles.require_nonempty_on_disk);

        let check = if toggles.check_updates && !installed.is_empty() {
            let candidates = reconcile::update_candidates(catalog, &partition);
            info!(count = candidates.len(), "Checking installed items for updates");
            UpdateCheck::Remote(self.details.time_updated(&candidates).await)
        } else {
            UpdateCheck::Disabled
        };

        let plan = reconcile::plan(catalog, &installed, &partition, &check);
        info!(
            catalog = plan.catalog_size,
            installed = plan.installed,
            new = plan.new,
            need_update = plan.need_update,
            up_to_date = plan.up_to_date,
            empty_or_missing = plan.empty_or_missing,
            to_fetch = plan.fetch_set.len(),
            skipped = plan.skipped(),
            "Reconciled catalog"
        );
        if plan.failed_batches > 0 {
            warn!(
                failed_batches = plan.failed_batches,
                "Some update checks failed, those items were treated as up to date"
            );
        }
        Ok(plan)
    }

    /// Plan, fetch and verify.
    ///
    /// The tool is checked before anything else; a missing executable fails
    /// the run with no network calls and no files written. An empty fetch
    /// set never starts the tool. Failed ids are written to `failure_path`.
    pub async fn run(
        &self,
        catalog: &Catalog,
        app_id: &str,
        failure_path: &Path,
    ) -> Result<SyncReport, SyncError> {
        validate_app_id(app_id)?;
        self.tool.check().await?;

        let plan = self.plan(catalog, app_id).await?;
        if plan.is_empty() {
            info!("Nothing to download");
            return Ok(SyncReport {
                app_id: app_id.to_string(),
                plan,
                run: None,
                verification: Default::default(),
                failures_file: None,
            });
        }

        let script = Runscript::new(app_id, plan.fetch_set.clone());
        let script_path = script.write_to(&self.config.steamcmd.runscript_dir())?;
        info!(
            tool = self.tool.name(),
            items = script.ids().len(),
            script = %script_path.display(),
            "Running fetch"
        );
        let run = self.tool.run(&script, &script_path).await?;

        // Fresh look at what actually landed.
        let layout = self.layout(app_id);
        let refreshed = read_installed_state(&layout.state_file());
        let verification = verify(&plan.fetch_set, &refreshed, &FsPresence::new(layout));

        let failures_file = if write_failures(failure_path, &verification.failed)? {
            warn!(
                failed = verification.failed.len(),
                file = %failure_path.display(),
                "Some items failed or are empty"
            );
            Some(failure_path.to_path_buf())
        } else {
            None
        };

        info!(
            succeeded = verification.succeeded.len(),
            failed = verification.failed.len(),
            "Sync finished"
        );

        Ok(SyncReport {
            app_id: app_id.to_string(),
            plan,
            run: Some(run),
            verification,
            failures_file,
        })
    }
}

fn validate_app_id(app_id: &str) -> Result<(), SyncError> {
    if !app_id.is_empty() && app_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SyncError::InvalidAppId(app_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetailsConfig, SteamCmdConfig};
    use crate::fetch::{Credentials, FetchError, SteamCmd, RUNSCRIPT_FILE};
    use crate::testing::{fixtures, MockDetailsApi, MockFetchTool};
    use tempfile::TempDir;

    const APP: &str = "294100";

    fn engine(temp: &TempDir) -> (SyncEngine<MockDetailsApi, MockFetchTool>, MockDetailsApi, MockFetchTool) {
        let root = temp.path().join("steamcmd");
        let config = Config {
            steamcmd: SteamCmdConfig {
                root: root.clone(),
                ..SteamCmdConfig::default()
            },
            details: DetailsConfig {
                batch_delay_ms: 0,
                ..DetailsConfig::default()
            },
            ..Config::default()
        };
        let api = MockDetailsApi::new();
        let tool = MockFetchTool::new(root);
        (SyncEngine::new(config, api.clone(), tool.clone()), api, tool)
    }

    #[test]
    fn test_validate_app_id() {
        assert!(validate_app_id("294100").is_ok());
        assert!(validate_app_id("").is_err());
        assert!(validate_app_id("29a").is_err());
    }

    #[tokio::test]
    async fn test_invalid_app_id_aborts_before_any_call() {
        let temp = TempDir::new().unwrap();
        let (engine, api, tool) = engine(&temp);
        let err = engine
            .run(&fixtures::catalog(&["1000001"]), "abc", &temp.path().join("f.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidAppId(_)));
        assert_eq!(api.requested_count().await, 0);
        assert_eq!(tool.run_count().await, 0);
    }

    #[tokio::test]
    async fn test_no_update_check_when_nothing_installed() {
        let temp = TempDir::new().unwrap();
        let (engine, api, _) = engine(&temp);
        let plan = engine
            .plan(&fixtures::catalog(&["1000001", "1000002"]), APP)
            .await
            .unwrap();
        assert_eq!(plan.fetch_set.len(), 2);
        assert_eq!(api.requested_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_check_only_asks_about_present_catalog_items() {
        let temp = TempDir::new().unwrap();
        let (engine, api, _) = engine(&temp);
        let layout = ContentLayout::new(temp.path().join("steamcmd"), APP);
        let a = fixtures::id("1000001");
        let b = fixtures::id("1000002");
        let stray = fixtures::id("1000009");
        fixtures::write_state(&layout, &[(a.clone(), 10), (b.clone(), 10), (stray.clone(), 10)]);
        fixtures::write_content(&layout, &a);
        fixtures::write_content(&layout, &stray);

        engine
            .plan(&fixtures::catalog(&["1000001", "1000002"]), APP)
            .await
            .unwrap();

        assert_eq!(api.recorded_calls().await, vec![vec![a]]);
    }

    #[tokio::test]
    async fn test_skip_disabled_fetches_everything() {
        let temp = TempDir::new().unwrap();
        let (mut engine, api, _) = engine(&temp);
        engine.config.sync.skip_already_downloaded = false;
        let layout = ContentLayout::new(temp.path().join("steamcmd"), APP);
        let a = fixtures::id("1000001");
        fixtures::write_state(&layout, &[(a.clone(), 10)]);
        fixtures::write_content(&layout, &a);

        let plan = engine
            .plan(&fixtures::catalog(&["1000001", "1000002"]), APP)
            .await
            .unwrap();
        assert_eq!(plan.fetch_set.len(), 2);
        assert_eq!(plan.installed, 1);
        assert_eq!(api.requested_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_steamcmd_aborts_before_update_check() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("steamcmd");
        let config = Config {
            steamcmd: SteamCmdConfig {
                root: root.clone(),
                ..SteamCmdConfig::default()
            },
            ..Config::default()
        };
        let api = MockDetailsApi::new();
        let tool = SteamCmd::new(
            root.join("nowhere").join("steamcmd.sh"),
            Credentials::Anonymous,
        );
        let engine = SyncEngine::new(config, api.clone(), tool);

        let layout = ContentLayout::new(&root, APP);
        let a = fixtures::id("1110001");
        fixtures::write_state(&layout, &[(a.clone(), 10)]);
        fixtures::write_content(&layout, &a);
        api.set_time_updated(&a, 20).await;

        let err = engine
            .run(
                &fixtures::catalog(&["1110001", "2220002"]),
                APP,
                &temp.path().join("failed_ids.txt"),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Fetch(FetchError::ExecutableNotFound { .. })
        ));
        assert_eq!(api.requested_count().await, 0);
        assert!(!root.join("run").join(RUNSCRIPT_FILE).exists());
    }

    #[tokio::test]
    async fn test_empty_fetch_set_skips_tool() {
        let temp = TempDir::new().unwrap();
        let (engine, _, tool) = engine(&temp);
        let layout = ContentLayout::new(temp.path().join("steamcmd"), APP);
        let a = fixtures::id("1000001");
        fixtures::write_state(&layout, &[(a.clone(), 10)]);
        fixtures::write_content(&layout, &a);

        let failure_path = temp.path().join("failed_ids.txt");
        let report = engine
            .run(&fixtures::catalog(&["1000001"]), APP, &failure_path)
            .await
            .unwrap();

        assert!(!report.fetched());
        assert_eq!(tool.run_count().await, 0);
        assert!(!failure_path.exists());
        assert!(!temp.path().join("steamcmd").join("run").exists());
    }
}
