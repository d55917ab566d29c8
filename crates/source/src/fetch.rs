//! Privacy policy discovery and download.

use crate::html::{extract_links, extract_paragraphs};
use policylens_core::{AppError, AppResult};
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Desktop browser UA; many sites reject unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Paragraph separator in extracted policy text.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Site name used to label a policy, e.g. `https://www.example.com/en` -> `example.com`.
pub fn logical_name(site: &str) -> String {
    let site = site.trim();
    let without_scheme = site
        .strip_prefix("https://")
        .or_else(|| site.strip_prefix("http://"))
        .unwrap_or(site);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);

    without_www
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_www)
        .to_string()
}

/// Parse a user-supplied site address, assuming https when no scheme is given.
pub fn parse_site_url(site: &str) -> AppResult<Url> {
    let site = site.trim();
    let candidate = if site.contains("://") {
        site.to_string()
    } else {
        format!("https://{}", site)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| AppError::Fetch(format!("Invalid URL '{}': {}", site, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Fetch(format!(
            "Unsupported URL scheme '{}' in '{}'",
            other, site
        ))),
    }
}

/// First link on the page whose text or target mentions "privacy", resolved
/// against `base`.
pub fn find_policy_link(base: &Url, html: &str) -> Option<Url> {
    extract_links(html)
        .into_iter()
        .filter(|link| {
            link.text.to_lowercase().contains("privacy")
                || link.href.to_lowercase().contains("privacy")
        })
        .find_map(|link| base.join(&link.href).ok())
}

/// Join extracted paragraphs into policy text.
pub fn policy_text_from_html(html: &str) -> String {
    extract_paragraphs(html).join(PARAGRAPH_SEPARATOR)
}

/// A downloaded policy.
#[derive(Debug, Clone)]
pub struct FetchedPolicy {
    /// Logical site name
    pub name: String,
    pub policy_url: Url,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PolicyFetcher {
    client: Client,
}

impl PolicyFetcher {
    pub fn new() -> AppResult<Self> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn get_html(&self, url: &Url) -> AppResult<String> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("{} returned {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to read body of {}: {}", url, e)))
    }

    /// Locate the privacy policy page linked from `site`.
    #[instrument(skip(self, site), fields(site = %site))]
    pub async fn find_policy_url(&self, site: &Url) -> AppResult<Option<Url>> {
        let html = self.get_html(site).await?;
        let found = find_policy_link(site, &html);

        match found {
            Some(ref url) => tracing::info!("Found privacy policy link: {}", url),
            None => tracing::warn!("No privacy policy link on {}", site),
        }

        Ok(found)
    }

    /// Download a policy page and return its paragraph text.
    ///
    /// A page with no paragraph text is `NoContentAvailable`.
    #[instrument(skip(self, policy_url), fields(url = %policy_url))]
    pub async fn fetch_policy_text(&self, policy_url: &Url) -> AppResult<String> {
        let html = self.get_html(policy_url).await?;
        let text = policy_text_from_html(&html);

        if text.is_empty() {
            return Err(AppError::NoContentAvailable(format!(
                "No paragraph text found at {} (pages rendered by JavaScript are not supported)",
                policy_url
            )));
        }

        tracing::info!("Extracted {} bytes of policy text", text.len());
        Ok(text)
    }

    /// Find and download the privacy policy of `site`.
    pub async fn fetch(&self, site: &str) -> AppResult<FetchedPolicy> {
        let site_url = parse_site_url(site)?;
        let name = logical_name(site);

        let policy_url = self
            .find_policy_url(&site_url)
            .await?
            .ok_or_else(|| AppError::Fetch(format!("Privacy policy page not found on {}", site)))?;

        let text = self.fetch_policy_text(&policy_url).await?;

        Ok(FetchedPolicy {
            name,
            policy_url,
            text,
        })
    }
}
