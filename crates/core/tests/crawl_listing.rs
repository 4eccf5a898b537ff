//! Listing crawl integration tests: crawl, titles, list files and archives.

use std::path::PathBuf;

use tempfile::TempDir;

use workshop_sync_core::{
    config::{Config, CrawlerConfig, DetailsConfig},
    crawler::ListingCrawler,
    testing::{fixtures, MockDetailsApi, MockFetchTool, MockListingSource},
    workspace::{ListPaths, OLD_RUNS_DIR, RUN_DATE_FILE},
    CrawlError, StopReason, SyncEngine, SyncError,
};

const LISTING: &str = "https://steamcommunity.com/workshop/browse/?appid=294100&browsesort=trend";

struct TestHarness {
    engine: SyncEngine<MockDetailsApi, MockFetchTool>,
    crawler: ListingCrawler<MockListingSource>,
    source: MockListingSource,
    details: MockDetailsApi,
    output_root: PathBuf,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_root = temp_dir.path().join("output");

        let mut config = Config {
            crawler: CrawlerConfig {
                page_delay_ms: 0,
                ..CrawlerConfig::default()
            },
            details: DetailsConfig {
                batch_delay_ms: 0,
                ..DetailsConfig::default()
            },
            ..Config::default()
        };
        config.output.root = output_root.clone();
        config.steamcmd.root = temp_dir.path().join("steamcmd");

        let source = MockListingSource::new();
        let details = MockDetailsApi::new();
        let crawler = ListingCrawler::new(source.clone(), &config.crawler);
        let tool = MockFetchTool::new(temp_dir.path().join("steamcmd"));
        let engine = SyncEngine::new(config, details.clone(), tool);

        Self {
            engine,
            crawler,
            source,
            details,
            output_root,
            _temp_dir: temp_dir,
        }
    }

    async fn set_pages(&self, pages: &[&[&str]]) {
        for (i, ids) in pages.iter().enumerate() {
            let mut body = fixtures::listing_page(ids);
            if i == 0 {
                body = format!("<title>Steam Workshop::RimWorld</title>{}", body);
            }
            self.source.set_page(i as u32 + 1, body).await;
        }
    }
}

#[tokio::test]
async fn test_crawl_writes_sorted_lists_with_titles() {
    let h = TestHarness::new();
    h.set_pages(&[&["9000009", "100000010"], &["2000002"]]).await;
    h.details
        .set_title(&fixtures::id("2000002"), "Better Trees")
        .await;
    h.details
        .set_title(&fixtures::id("9000009"), "Hospitality")
        .await;

    let outcome = h.engine.crawl_listing(&h.crawler, LISTING).await.unwrap();

    let scope_dir = h.output_root.join("RimWorld - 294100");
    assert_eq!(outcome.scope_dir, scope_dir);
    assert_eq!(outcome.scope.app_id.as_deref(), Some("294100"));
    assert_eq!(outcome.report.stop, StopReason::NoNewItems { page: 4 });
    assert_eq!(outcome.titled, 2);
    assert!(scope_dir.join(RUN_DATE_FILE).exists());

    let lists = ListPaths::for_scope(&scope_dir);
    assert_eq!(outcome.lists.as_ref(), Some(&lists));
    assert_eq!(
        fixtures::read_lines(&lists.ids),
        vec!["2000002", "9000009", "100000010"]
    );
    assert_eq!(
        fixtures::read_lines(&lists.urls)[0],
        "https://steamcommunity.com/sharedfiles/filedetails/?id=2000002"
    );
    assert_eq!(
        fixtures::read_lines(&lists.ids_titles),
        vec!["2000002\tBetter Trees", "9000009\tHospitality", "100000010\t"]
    );
}

#[tokio::test]
async fn test_recrawl_archives_previous_lists() {
    let h = TestHarness::new();
    h.set_pages(&[&["1000001"]]).await;
    let first = h.engine.crawl_listing(&h.crawler, LISTING).await.unwrap();
    assert!(first.archived_to.is_none());

    h.set_pages(&[&["1000001", "1000002"]]).await;
    let second = h.engine.crawl_listing(&h.crawler, LISTING).await.unwrap();

    let archive = second.archived_to.expect("previous lists archived");
    assert!(archive.starts_with(first.scope_dir.join(OLD_RUNS_DIR)));
    assert_eq!(fixtures::read_lines(&archive.join("ids.txt")), vec!["1000001"]);

    let lists = ListPaths::for_scope(&second.scope_dir);
    assert_eq!(fixtures::read_lines(&lists.ids), vec!["1000001", "1000002"]);
}

#[tokio::test]
async fn test_empty_crawl_writes_nothing() {
    let h = TestHarness::new();

    let outcome = h.engine.crawl_listing(&h.crawler, LISTING).await.unwrap();

    assert!(outcome.report.ids.is_empty());
    assert!(outcome.lists.is_none());
    assert!(!outcome.scope_dir.exists());
    assert_eq!(h.details.requested_count().await, 0);
}

#[tokio::test]
async fn test_page_failure_still_saves_partial_results() {
    let h = TestHarness::new();
    h.set_pages(&[&["1000001"], &["1000002"]]).await;
    h.source.fail_page(3).await;

    let outcome = h.engine.crawl_listing(&h.crawler, LISTING).await.unwrap();

    assert!(matches!(
        outcome.report.stop,
        StopReason::PageFailed { page: 3, .. }
    ));
    assert!(!outcome.report.stop.is_complete());
    let lists = outcome.lists.expect("lists written");
    assert_eq!(fixtures::read_lines(&lists.ids), vec!["1000001", "1000002"]);
}

#[tokio::test]
async fn test_title_lookup_failure_leaves_titles_blank() {
    let h = TestHarness::new();
    h.set_pages(&[&["1000001"]]).await;
    h.details
        .set_title(&fixtures::id("1000001"), "Never Seen")
        .await;
    h.details.fail_call(0).await;

    let outcome = h.engine.crawl_listing(&h.crawler, LISTING).await.unwrap();

    assert_eq!(outcome.titled, 0);
    let lists = outcome.lists.expect("lists written");
    assert_eq!(fixtures::read_lines(&lists.ids_titles), vec!["1000001\t"]);
}

#[tokio::test]
async fn test_pages_keep_listing_query() {
    let h = TestHarness::new();
    h.set_pages(&[&["1000001"]]).await;

    h.engine.crawl_listing(&h.crawler, LISTING).await.unwrap();

    let urls = h.source.requested_urls().await;
    assert!(urls.len() >= 2);
    for url in &urls {
        assert!(url.contains("appid=294100"), "{}", url);
        assert!(url.contains("browsesort=trend"), "{}", url);
    }
    assert!(urls.iter().any(|url| url.contains("p=2")));
}

#[tokio::test]
async fn test_non_workshop_url_is_rejected() {
    let h = TestHarness::new();
    h.set_pages(&[&["1000001"]]).await;

    for url in [
        "https://example.com/workshop/browse/?appid=294100",
        "https://steamcommunity.com/market/listings/294100",
        "http://steamcommunity.com/workshop/browse/?appid=294100",
    ] {
        let err = h.engine.crawl_listing(&h.crawler, url).await.unwrap_err();
        assert!(
            matches!(err, SyncError::Crawl(CrawlError::InvalidUrl(_))),
            "{}",
            url
        );
    }

    assert!(h.source.requested_urls().await.is_empty());
    assert!(!h.output_root.exists());
}
