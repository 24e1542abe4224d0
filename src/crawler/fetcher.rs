use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{ExtractError, FetchError};
use crate::settings::CrawlSettings;

/// A successfully fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Frontier key the page was requested under.
    pub url: String,
    /// Where the response came from after redirects. Relative links resolve
    /// against this.
    pub final_url: String,
    pub depth: usize,
    pub status: u16,
    pub body: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(settings: &CrawlSettings) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(ExtractError::Client)?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str, depth: usize) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let final_url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        // a missing header is given the benefit of the doubt
        if !content_type.is_empty()
            && !content_type.contains("text/html")
            && !content_type.contains("application/xhtml")
        {
            return Err(FetchError::NotHtml(content_type));
        }

        let body = response.text().await?;
        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(url, status = status.as_u16(), latency_ms, "fetched");

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            depth,
            status: status.as_u16(),
            body,
            latency_ms,
        })
    }
}
