use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Heading used for content captured before any heading was seen.
pub const UNTITLED_SECTION: &str = "Untitled Section";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Paragraph,
    OrderedListItem,
    UnorderedListItem,
    Table,
}

impl ContentType {
    pub fn is_list(self) -> bool {
        matches!(self, ContentType::OrderedListItem | ContentType::UnorderedListItem)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Paragraph => "paragraph",
            ContentType::OrderedListItem => "ordered_list_item",
            ContentType::UnorderedListItem => "unordered_list_item",
            ContentType::Table => "table",
        }
    }
}

/// One unit of extracted content, stamped with the heading context that was
/// current when it was captured.
///
/// `heading_path.len() == heading_level`, and `heading` is the last path entry
/// whenever the level is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Page URL for web content, `None` for documents.
    pub source_location: Option<String>,
    pub content_type: ContentType,
    pub heading: String,
    pub heading_path: Vec<String>,
    pub heading_level: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<String>>,
    pub fingerprint: Fingerprint,
}
