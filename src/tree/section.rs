use serde::{Deserialize, Serialize};

use crate::model::{ContentItem, ContentType};

/// Heading node of the section tree. The root is synthetic (level 0) and
/// titled after the document or site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    pub title: String,
    pub level: usize,
    pub items: Vec<ContentItem>,
    pub children: Vec<SectionNode>,
}

impl SectionNode {
    pub fn root(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: 0,
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Siblings with the same title are the same node.
    fn child_mut(&mut self, title: &str) -> &mut SectionNode {
        match self.children.iter().position(|c| c.title == title) {
            Some(i) => &mut self.children[i],
            None => {
                self.children.push(SectionNode {
                    title: title.to_string(),
                    level: self.level + 1,
                    items: Vec::new(),
                    children: Vec::new(),
                });
                let last = self.children.len() - 1;
                &mut self.children[last]
            }
        }
    }

    /// Attach the item under its heading path, creating missing nodes.
    pub fn insert(&mut self, item: ContentItem) {
        let mut node = self;
        for title in &item.heading_path {
            node = node.child_mut(title);
        }
        node.items.push(item);
    }

    pub fn find(&self, path: &[String]) -> Option<&SectionNode> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .children
                .iter()
                .find(|c| &c.title == head)
                .and_then(|c| c.find(rest)),
        }
    }

    /// Items in this subtree, depth first.
    pub fn item_count(&self) -> usize {
        self.items.len() + self.children.iter().map(SectionNode::item_count).sum::<usize>()
    }
}

pub fn build(root_title: &str, items: &[ContentItem]) -> SectionNode {
    let mut root = SectionNode::root(root_title);
    for item in items {
        root.insert(item.clone());
    }
    root
}

/// Consecutive list items of the same kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListGroup {
    pub ordered: bool,
    pub items: Vec<String>,
}

/// Presentation view of a [`SectionNode`]: content grouped by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub level: usize,
    pub paragraphs: Vec<String>,
    pub lists: Vec<ListGroup>,
    pub tables: Vec<String>,
    pub subsections: Vec<Section>,
}

impl Section {
    pub fn from_node(node: &SectionNode) -> Self {
        let mut paragraphs = Vec::new();
        let mut lists: Vec<ListGroup> = Vec::new();
        let mut tables = Vec::new();
        // kind of the list group still open, if any
        let mut open: Option<ContentType> = None;

        for item in &node.items {
            match item.content_type {
                ContentType::Paragraph => {
                    paragraphs.push(item.text.clone());
                    open = None;
                }
                ContentType::Table => {
                    tables.push(item.text.clone());
                    open = None;
                }
                kind @ (ContentType::OrderedListItem | ContentType::UnorderedListItem) => {
                    let entries = item
                        .list_items
                        .clone()
                        .unwrap_or_else(|| vec![item.text.clone()]);
                    match lists.last_mut() {
                        Some(group) if open == Some(kind) => group.items.extend(entries),
                        _ => lists.push(ListGroup {
                            ordered: kind == ContentType::OrderedListItem,
                            items: entries,
                        }),
                    }
                    open = Some(kind);
                }
            }
        }

        Section {
            title: node.title.clone(),
            level: node.level,
            paragraphs,
            lists,
            tables,
            subsections: node.children.iter().map(Section::from_node).collect(),
        }
    }
}
