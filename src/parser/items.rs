use tracing::debug;

use super::blocks::{table_text, Block};
use crate::dedup::DedupState;
use crate::fingerprint::fingerprint;
use crate::heading::HeadingContext;
use crate::model::{ContentItem, ContentType};
use crate::text::{contains_markup, normalize, word_count};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectStats {
    pub accepted: usize,
    pub too_short: usize,
    pub markup: usize,
    pub duplicates: usize,
}

/// Turns a block stream into content items: tracks headings, filters trivial
/// candidates and drops fingerprints already seen in this run.
pub struct ItemCollector<'a> {
    source: Option<String>,
    context: HeadingContext,
    dedup: &'a DedupState,
    min_words: usize,
    items: Vec<ContentItem>,
    stats: CollectStats,
}

impl<'a> ItemCollector<'a> {
    pub fn new(source: Option<String>, dedup: &'a DedupState, min_words: usize) -> Self {
        Self {
            source,
            context: HeadingContext::new(),
            dedup,
            min_words,
            items: Vec::new(),
            stats: CollectStats::default(),
        }
    }

    /// Returns true when the block produced a new item.
    pub fn push(&mut self, block: Block) -> bool {
        let content_type = match block.content_type() {
            Some(ct) => ct,
            None => {
                if let Block::Heading { level, text } = &block {
                    self.context.on_heading(*level, &normalize(text));
                }
                return false;
            }
        };

        let (text, list_items) = match block {
            Block::Heading { .. } => return false,
            Block::Paragraph(raw) => (normalize(&raw), None),
            Block::ListItem { text: raw, .. } => {
                let text = normalize(&raw);
                (text, Some(vec![raw.trim().to_string()]))
            }
            Block::Table(rows) => (table_text(&rows), None),
        };

        if !self.accept(content_type, &text) {
            return false;
        }

        let stamp = self.context.on_content();
        let fp = fingerprint(&stamp.heading, &text);
        if !self.dedup.insert(&fp) {
            self.stats.duplicates += 1;
            debug!(heading = %stamp.heading, "duplicate content dropped");
            return false;
        }

        self.stats.accepted += 1;
        self.items.push(ContentItem {
            source_location: self.source.clone(),
            content_type,
            heading: stamp.heading,
            heading_path: stamp.path,
            heading_level: stamp.level,
            text,
            list_items,
            fingerprint: fp,
        });
        true
    }

    fn accept(&mut self, content_type: ContentType, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if contains_markup(text) {
            self.stats.markup += 1;
            return false;
        }
        if content_type != ContentType::Table && word_count(text) < self.min_words {
            self.stats.too_short += 1;
            return false;
        }
        true
    }

    pub fn stats(&self) -> CollectStats {
        self.stats
    }

    pub fn finish(self) -> Vec<ContentItem> {
        self.items
    }
}
