//! Crawl a website or read a `.docx` file and reduce it to heading-stamped,
//! de-duplicated content items plus navigable trees.

pub mod crawler;
pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod heading;
pub mod model;
pub mod parser;
pub mod settings;
pub mod store;
pub mod text;
pub mod tree;

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::crawler::{CrawlReport, Crawler};
use crate::dedup::DedupState;
use crate::parser::html::HtmlExtractor;
use crate::tree::{Section, SectionNode, SiteNode, SitePage};

pub use crate::error::{ExtractError, ExtractionWarning, FetchError};
pub use crate::model::{ContentItem, ContentType};
pub use crate::settings::Settings;

#[derive(Debug, Clone, Serialize)]
pub struct WebsiteExtraction {
    pub items: Vec<ContentItem>,
    pub site_tree: SiteNode,
    pub section_tree: SectionNode,
    pub report: CrawlReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentExtraction {
    pub title: String,
    pub items: Vec<ContentItem>,
    pub section_tree: SectionNode,
    pub sections: Section,
    pub warnings: Vec<ExtractionWarning>,
}

/// Crawl `seed` up to `max_depth` hops on the same site and extract the
/// content of every page fetched. Failed fetches are skipped and reported.
pub async fn extract_from_website(
    seed: &str,
    max_depth: usize,
    settings: &Settings,
) -> Result<WebsiteExtraction, ExtractError> {
    settings.validate()?;
    let extractor = HtmlExtractor::new(
        &settings.extract.container_selectors,
        settings.extract.min_words,
    )?;
    let crawler = Crawler::new(seed, max_depth, &settings.crawl)?;
    info!(seed = %crawler.seed(), max_depth, "crawl started");

    let mut pages = crawler.discover().await?;
    pages.extend(crawler.fetch_all().await);

    let min_words = settings.extract.min_words;
    let contents = tokio::task::spawn_blocking(move || {
        let dedup = DedupState::new();
        pages
            .par_iter()
            .map(|page| parser::process_page(page, &extractor, &dedup, min_words))
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| ExtractError::Worker(e.to_string()))?;

    let site_pages: Vec<SitePage> = contents
        .iter()
        .map(|c| SitePage {
            url: c.url.clone(),
            title: c.title.clone(),
        })
        .collect();
    let items = dedup::compact(contents.into_iter().flat_map(|c| c.items).collect());

    let site_tree = tree::site::build(crawler.seed(), &site_pages);
    let section_tree = tree::section::build(&site_tree.title, &items);
    let report = crawler.report();
    info!(
        pages = report.pages_fetched,
        failed = report.pages_failed(),
        mean_latency_ms = report.mean_latency_ms().unwrap_or_default(),
        site_nodes = site_tree.node_count(),
        items = items.len(),
        "crawl finished"
    );

    Ok(WebsiteExtraction {
        items,
        site_tree,
        section_tree,
        report,
    })
}

/// Read one `.docx` file into content items and a section tree.
pub fn extract_from_document(
    path: &Path,
    settings: &Settings,
) -> Result<DocumentExtraction, ExtractError> {
    settings.validate()?;
    let dedup = DedupState::new();
    let content = parser::process_document(path, &dedup, settings.extract.min_words)?;
    let items = dedup::compact(content.items);

    let section_tree = tree::section::build(&content.title, &items);
    let sections = Section::from_node(&section_tree);
    info!(
        path = %path.display(),
        items = items.len(),
        warnings = content.warnings.len(),
        "document extracted"
    );

    Ok(DocumentExtraction {
        title: content.title,
        items,
        section_tree,
        sections,
        warnings: content.warnings,
    })
}
