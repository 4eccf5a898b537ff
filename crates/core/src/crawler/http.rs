//! reqwest-backed listing source.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;

use super::cookies::load_cookie_jar;
use super::{CrawlError, ListingSource};

/// Page that redirects to the login form unless the session is signed in.
const LOGIN_PROBE_URL: &str = "https://steamcommunity.com/my/edit";

/// Fetches listing pages over HTTP, optionally with a signed-in cookie jar.
pub struct HttpListingSource {
    client: Client,
    authenticated: bool,
}

impl HttpListingSource {
    /// Anonymous session.
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Self::builder(config).build()?;
        Ok(Self {
            client,
            authenticated: false,
        })
    }

    /// Session carrying the cookies in `jar`.
    pub fn with_cookies(config: &CrawlerConfig, jar: Arc<Jar>) -> Result<Self, CrawlError> {
        let client = Self::builder(config).cookie_provider(jar).build()?;
        Ok(Self {
            client,
            authenticated: true,
        })
    }

    /// Pick a session from configuration.
    ///
    /// Uses the configured cookie file when it loads and the login probe
    /// confirms it; every cookie problem falls back to an anonymous session.
    pub async fn from_config(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let cookie_path = match (&config.cookie_path, config.use_cookies) {
            (Some(path), true) => path,
            _ => return Self::new(config),
        };

        match load_cookie_jar(cookie_path) {
            Ok(loaded) => {
                info!(
                    format = %loaded.format,
                    count = loaded.count,
                    path = %cookie_path.display(),
                    "Loaded cookies"
                );
                let source = Self::with_cookies(config, loaded.jar)?;
                if source.cookies_active().await {
                    info!("Cookies active, crawling signed in");
                    return Ok(source);
                }
                warn!("Cookies inactive, crawling without cookies");
            }
            Err(e) => warn!(error = %e, "Failed to load cookies, crawling without cookies"),
        }

        Self::new(config)
    }

    fn builder(config: &CrawlerConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the session is signed in: the probe page loads without being
    /// redirected to a login URL.
    pub async fn cookies_active(&self) -> bool {
        match self.client.get(LOGIN_PROBE_URL).send().await {
            Ok(response) => {
                let final_url = response.url().as_str().to_lowercase();
                debug!(status = %response.status(), url = %final_url, "Login probe");
                response.status().as_u16() == 200 && !final_url.contains("login")
            }
            Err(e) => {
                warn!(error = %e, "Cookie check failed");
                false
            }
        }
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    fn name(&self) -> &str {
        if self.authenticated {
            "http+cookies"
        } else {
            "http"
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, CrawlError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
