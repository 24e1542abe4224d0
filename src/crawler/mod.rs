pub mod fetcher;
pub mod frontier;
pub mod links;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use scraper::Html;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ExtractError, FetchError};
use crate::settings::CrawlSettings;
pub use fetcher::{FetchedPage, Fetcher};
pub use frontier::{CrawlFrontier, CrawlState};

#[derive(Debug, Clone, Serialize)]
pub struct FailedFetch {
    pub url: String,
    pub depth: usize,
    pub error: String,
}

/// One successful fetch as recorded in the report.
#[derive(Debug, Clone, Serialize)]
pub struct PageFetch {
    pub url: String,
    /// Set when the request was redirected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub depth: usize,
    pub status: u16,
    pub latency_ms: u64,
}

/// Summary returned next to the content of a crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub seed: String,
    pub max_depth: usize,
    pub pages_fetched: usize,
    pub fetched: Vec<PageFetch>,
    pub failed: Vec<FailedFetch>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn pages_failed(&self) -> usize {
        self.failed.len()
    }

    pub fn mean_latency_ms(&self) -> Option<u64> {
        let n = self.fetched.len() as u64;
        (n > 0).then(|| self.fetched.iter().map(|p| p.latency_ms).sum::<u64>() / n)
    }
}

/// Seeds must be absolute http(s) URLs with a host.
pub fn parse_seed(seed: &str) -> Result<Url, ExtractError> {
    let url = Url::parse(seed.trim())
        .map_err(|e| ExtractError::Configuration(format!("invalid seed url {:?}: {}", seed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::Configuration(format!(
            "seed url {:?} must use http or https",
            seed
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ExtractError::Configuration(format!(
            "seed url {:?} has no host",
            seed
        )));
    }
    links::canonicalize(url)
        .ok_or_else(|| ExtractError::Configuration(format!("unsupported seed url {:?}", seed)))
}

/// Breadth-first, same-site crawler bounded by `max_depth` hops from the seed.
pub struct Crawler {
    seed: Url,
    domain: String,
    state: Arc<CrawlState>,
    fetcher: Fetcher,
    settings: CrawlSettings,
    fetched: Mutex<Vec<PageFetch>>,
    failed: Mutex<Vec<FailedFetch>>,
    started_at: DateTime<Utc>,
}

impl Crawler {
    pub fn new(seed: &str, max_depth: usize, settings: &CrawlSettings) -> Result<Self, ExtractError> {
        let seed = parse_seed(seed)?;
        let domain = links::site_domain(&seed)
            .ok_or_else(|| ExtractError::Configuration(format!("seed {} has no host", seed)))?;
        let state = Arc::new(CrawlState::new(seed.as_str(), max_depth));
        Ok(Self {
            seed,
            domain,
            state,
            fetcher: Fetcher::new(settings)?,
            settings: settings.clone(),
            fetched: Mutex::new(Vec::new()),
            failed: Mutex::new(Vec::new()),
            started_at: Utc::now(),
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Fetch every level below the depth bound and queue the links found on
    /// it one hop deeper. Pages on the last level stay queued for
    /// [`Crawler::fetch_all`].
    pub async fn discover(&self) -> Result<Vec<FetchedPage>, ExtractError> {
        let mut pages = Vec::new();

        for depth in 0..self.state.max_depth() {
            let batch: Vec<(String, usize)> = self
                .state
                .take_depth(depth)
                .into_iter()
                .map(|u| (u, depth))
                .collect();
            if batch.is_empty() {
                break;
            }

            let fetched = self.fetch_batch(batch).await;
            let (fetched, enqueued) = self.enqueue_links(fetched, depth + 1).await?;
            info!(depth, pages = fetched.len(), enqueued, "level crawled");
            pages.extend(fetched);
        }

        Ok(pages)
    }

    /// Fetch whatever is still queued. Links on these pages are not followed.
    pub async fn fetch_all(&self) -> Vec<FetchedPage> {
        let batch = self.state.take_all();
        if batch.is_empty() {
            return Vec::new();
        }
        let pages = self.fetch_batch(batch).await;
        info!(pages = pages.len(), "frontier drained");
        pages
    }

    pub fn report(&self) -> CrawlReport {
        let fetched = self
            .fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let failed = self
            .failed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        CrawlReport {
            seed: self.seed.to_string(),
            max_depth: self.state.max_depth(),
            pages_fetched: fetched.len(),
            fetched,
            failed,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }

    /// Fetch a batch concurrently. Failures are logged, recorded and dropped.
    async fn fetch_batch(&self, batch: Vec<(String, usize)>) -> Vec<FetchedPage> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let pb = self.progress_bar(batch.len());

        let (tx, mut rx) =
            tokio::sync::mpsc::channel::<(String, usize, Result<FetchedPage, FetchError>)>(
                self.settings.concurrency.max(1) * 2,
            );

        for (url, depth) in batch {
            let fetcher = self.fetcher.clone();
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return;
                };
                let result = fetcher.fetch(&url, depth).await;
                let _ = tx.send((url, depth, result)).await;
            });
        }

        // rx closes once every task has dropped its sender
        drop(tx);

        let mut pages = Vec::new();
        while let Some((url, depth, result)) = rx.recv().await {
            match result.and_then(|page| self.check_final_url(page)) {
                Ok(page) => {
                    self.record_fetch(&page);
                    pages.push(page);
                }
                Err(e) => {
                    warn!(url = %url, depth, error = %e, "fetch failed, skipping");
                    self.failed
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(FailedFetch {
                            url,
                            depth,
                            error: e.to_string(),
                        });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        pages.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));
        pages
    }

    /// Redirects may leave the site; such pages are failures. A redirect
    /// target on the site is marked visited so it is not fetched twice.
    fn check_final_url(&self, page: FetchedPage) -> Result<FetchedPage, FetchError> {
        if page.final_url == page.url {
            return Ok(page);
        }
        let on_site = Url::parse(&page.final_url)
            .ok()
            .is_some_and(|u| links::same_site(&u, &self.domain));
        if !on_site {
            return Err(FetchError::OffSite(page.final_url));
        }
        self.state.mark_visited(&page.final_url);
        debug!(from = %page.url, to = %page.final_url, "redirected");
        Ok(page)
    }

    fn record_fetch(&self, page: &FetchedPage) {
        debug!(url = %page.url, status = page.status, latency_ms = page.latency_ms, "page kept");
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PageFetch {
                url: page.url.clone(),
                final_url: (page.final_url != page.url).then(|| page.final_url.clone()),
                depth: page.depth,
                status: page.status,
                latency_ms: page.latency_ms,
            });
    }

    /// Parse the pages on the rayon pool and queue their same-site links at
    /// `next_depth`. Returns the pages back with the number of new entries.
    async fn enqueue_links(
        &self,
        pages: Vec<FetchedPage>,
        next_depth: usize,
    ) -> Result<(Vec<FetchedPage>, usize), ExtractError> {
        let state = Arc::clone(&self.state);
        let domain = self.domain.clone();

        tokio::task::spawn_blocking(move || {
            let enqueued = pages
                .par_iter()
                .map(|page| queue_page_links(page, &domain, &state, next_depth))
                .sum();
            (pages, enqueued)
        })
        .await
        .map_err(|e| ExtractError::Worker(e.to_string()))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}

fn queue_page_links(page: &FetchedPage, domain: &str, state: &CrawlState, depth: usize) -> usize {
    let Ok(base) = Url::parse(&page.final_url) else {
        return 0;
    };
    let document = Html::parse_document(&page.body);
    let mut added = 0;
    for link in links::extract(&document, &base, domain) {
        if state.enqueue(link.as_str(), depth) {
            debug!(from = %page.url, to = %link, depth, "queued");
            added += 1;
        }
    }
    added
}
