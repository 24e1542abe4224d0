pub mod blocks;
pub mod docx;
pub mod html;
pub mod items;

use std::path::Path;

use scraper::Html;
use tracing::debug;

use crate::crawler::FetchedPage;
use crate::dedup::DedupState;
use crate::error::{ExtractError, ExtractionWarning};
use crate::model::ContentItem;
use html::HtmlExtractor;
use items::ItemCollector;

/// Content of one fetched page.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub url: String,
    pub title: Option<String>,
    pub items: Vec<ContentItem>,
}

/// Two-pass pipeline: html → blocks → items.
pub fn process_page(
    page: &FetchedPage,
    extractor: &HtmlExtractor,
    dedup: &DedupState,
    min_words: usize,
) -> PageContent {
    let document = Html::parse_document(&page.body);
    let title = html::page_title(&document);
    let blocks = extractor.page_blocks(&page.url, &document);

    let mut collector = ItemCollector::new(Some(page.url.clone()), dedup, min_words);
    for block in blocks {
        collector.push(block);
    }
    let stats = collector.stats();
    debug!(
        url = %page.url,
        accepted = stats.accepted,
        too_short = stats.too_short,
        markup = stats.markup,
        duplicates = stats.duplicates,
        "page extracted"
    );

    PageContent {
        url: page.url.clone(),
        title,
        items: collector.finish(),
    }
}

/// Content of one `.docx` file.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub title: String,
    pub items: Vec<ContentItem>,
    pub warnings: Vec<ExtractionWarning>,
}

/// docx → blocks → items, with a single heading context for the whole file.
pub fn process_document(
    path: &Path,
    dedup: &DedupState,
    min_words: usize,
) -> Result<DocumentContent, ExtractError> {
    let doc = docx::read(path)?;
    let title = doc
        .title
        .clone()
        .or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| path.display().to_string());

    let mut collector = ItemCollector::new(None, dedup, min_words);
    for block in doc.blocks {
        collector.push(block);
    }
    let stats = collector.stats();
    debug!(
        path = %path.display(),
        accepted = stats.accepted,
        too_short = stats.too_short,
        duplicates = stats.duplicates,
        "document extracted"
    );

    Ok(DocumentContent {
        title,
        items: collector.finish(),
        warnings: doc.warnings,
    })
}
