mod cli;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workshop_sync_core::crawler::is_listing_url;
use workshop_sync_core::{
    load_config, load_config_or_default, validate_config, Catalog, Config, Credentials,
    HttpListingSource, ListingCrawler, SteamCmd, SteamDetailsClient, SyncEngine,
};

use cli::{Cli, Command, TargetArgs, PASSWORD_ENV};

/// Config file used when none is given.
const DEFAULT_CONFIG: &str = "wsync.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn load(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_config_or_default(&PathBuf::from(DEFAULT_CONFIG))
            .context("Failed to load default config")?,
    };
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load(cli.config.as_ref())?;

    match cli.command {
        Command::Crawl { url } => crawl(config, &url).await,
        Command::Plan { target, json } => plan(config, &target, json).await,
        Command::Sync { target, username } => sync(config, &target, username).await,
    }
}

fn engine(
    config: Config,
    credentials: Credentials,
) -> Result<SyncEngine<SteamDetailsClient, SteamCmd>> {
    let details =
        SteamDetailsClient::new(&config.details).context("Failed to create details client")?;
    let tool = SteamCmd::new(config.steamcmd.executable_path(), credentials);
    Ok(SyncEngine::new(config, details, tool))
}

async fn crawl(config: Config, url: &str) -> Result<()> {
    if !is_listing_url(url) {
        bail!("Not a Steam Workshop URL: {}", url);
    }

    let source = HttpListingSource::from_config(&config.crawler)
        .await
        .context("Failed to create HTTP client")?;
    let crawler = ListingCrawler::new(source, &config.crawler);
    let engine = engine(config, Credentials::Anonymous)?;

    let outcome = engine.crawl_listing(&crawler, url).await?;
    if !outcome.report.stop.is_complete() {
        warn!(stop = ?outcome.report.stop, "Crawl stopped early, lists may be incomplete");
    }

    match &outcome.lists {
        Some(lists) => {
            println!("Saved {} items to:", outcome.report.ids.len());
            for path in lists.all() {
                println!("  {}", path.display());
            }
        }
        None => println!("No items found."),
    }
    Ok(())
}

async fn plan(config: Config, target: &TargetArgs, json: bool) -> Result<()> {
    let target = target.resolve(&config.output.root)?;
    let catalog = Catalog::load(&target.catalog_path)?;
    info!(
        catalog = %target.catalog_path.display(),
        items = catalog.len(),
        app_id = %target.app_id,
        "Loaded catalog"
    );

    let engine = engine(config, Credentials::Anonymous)?;
    let plan = engine.plan(&catalog, &target.app_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} to download ({} new, {} to update, {} empty or missing), {} skipped",
        plan.fetch_set.len(),
        plan.new,
        plan.need_update,
        plan.empty_or_missing,
        plan.skipped()
    );
    for id in &plan.fetch_set {
        println!("  {}", id);
    }
    Ok(())
}

async fn sync(config: Config, target: &TargetArgs, username: Option<String>) -> Result<()> {
    let target = target.resolve(&config.output.root)?;
    let catalog = Catalog::load(&target.catalog_path)?;
    info!(
        catalog = %target.catalog_path.display(),
        items = catalog.len(),
        app_id = %target.app_id,
        "Loaded catalog"
    );

    let credentials = Credentials::from_parts(username, std::env::var(PASSWORD_ENV).ok());
    let engine = engine(config, credentials)?;
    let report = engine
        .run(&catalog, &target.app_id, &target.failure_path)
        .await?;

    if !report.fetched() {
        println!("Everything is up to date.");
        return Ok(());
    }

    println!(
        "{} succeeded, {} failed",
        report.verification.succeeded.len(),
        report.verification.failed.len()
    );
    if let Some(path) = &report.failures_file {
        println!("Failed ids written to {}", path.display());
    }
    Ok(())
}
