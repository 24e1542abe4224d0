use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, PoisonError};

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::blocks::Block;
use crate::error::ExtractError;
use crate::text::{normalize, word_count};

static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static H1_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static BODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Subtrees that never carry page content.
const BOILERPLATE_TAGS: &[&str] = &[
    "nav", "footer", "aside", "script", "style", "noscript", "form", "template",
];

/// Walks content containers of fetched pages and emits blocks in document
/// order. One instance serves every page of a run; the processed-key set
/// makes sure a (page, selector) pair is walked at most once.
pub struct HtmlExtractor {
    containers: Vec<(String, Selector)>,
    processed: Mutex<HashSet<String>>,
    min_words: usize,
}

impl HtmlExtractor {
    pub fn new(selectors: &[String], min_words: usize) -> Result<Self, ExtractError> {
        let containers = selectors
            .iter()
            .map(|s| {
                Selector::parse(s)
                    .map(|sel| (s.clone(), sel))
                    .map_err(|e| ExtractError::Configuration(format!("invalid selector {:?}: {}", s, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            containers,
            processed: Mutex::new(HashSet::new()),
            min_words,
        })
    }

    /// Blocks of every content container on the page, in document order.
    /// Falls back to `<body>` when no container selector matches.
    pub fn page_blocks(&self, page_url: &str, document: &Html) -> Vec<Block> {
        let mut walker = Walker {
            min_words: self.min_words,
            walked: HashSet::new(),
            emitted: HashSet::new(),
            blocks: Vec::new(),
        };
        let mut matched_any = false;
        let mut chosen: HashSet<NodeId> = HashSet::new();

        for (raw, selector) in &self.containers {
            let mut matches = document.select(selector).peekable();
            if matches.peek().is_none() {
                continue;
            }
            matched_any = true;

            if !self.mark_processed(page_url, raw) {
                debug!(page = page_url, selector = %raw, "container already processed");
                continue;
            }
            chosen.extend(matches.map(|c| c.id()));
        }

        // outermost containers first, in document order; nested ones are
        // already covered by their ancestor
        for container in document.root_element().descendants().filter_map(ElementRef::wrap) {
            if !chosen.contains(&container.id())
                || container.ancestors().any(|a| chosen.contains(&a.id()))
            {
                continue;
            }
            walker.walk(container);
        }

        if !matched_any {
            if let Some(body) = document.select(&BODY_SEL).next() {
                if self.mark_processed(page_url, "body") {
                    walker.walk(body);
                }
            }
        }

        walker.blocks
    }

    fn mark_processed(&self, page_url: &str, selector: &str) -> bool {
        let key = format!("{}|{}", page_url, selector);
        self.processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }
}

struct Walker {
    min_words: usize,
    /// Containers already walked on this page.
    walked: HashSet<NodeId>,
    /// Elements already turned into a block.
    emitted: HashSet<NodeId>,
    blocks: Vec<Block>,
}

impl Walker {
    fn walk(&mut self, container: ElementRef) {
        let inside_boilerplate = container.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| BOILERPLATE_TAGS.contains(&e.name()))
        });
        if inside_boilerplate
            || self.walked.contains(&container.id())
            || container.ancestors().any(|a| self.walked.contains(&a.id()))
        {
            return;
        }
        self.walked.insert(container.id());

        for node in container.descendants().skip(1) {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            if self.emitted.contains(&el.id())
                || self.walked.contains(&el.id())
                || self.is_shadowed(el, container.id())
            {
                continue;
            }
            if let Some(block) = self.classify(el) {
                self.emitted.insert(el.id());
                self.blocks.push(block);
            }
        }
    }

    /// Inside something already emitted or walked, or inside boilerplate.
    /// Nested list items stay visible under their parent item.
    fn is_shadowed(&self, el: ElementRef, container: NodeId) -> bool {
        let name = el.value().name();
        if BOILERPLATE_TAGS.contains(&name) {
            return true;
        }
        for ancestor in el.ancestors() {
            if ancestor.id() == container {
                return false;
            }
            let ancestor_name = ancestor.value().as_element().map(|a| a.name());
            if self.emitted.contains(&ancestor.id()) && !(name == "li" && ancestor_name == Some("li")) {
                return true;
            }
            if self.walked.contains(&ancestor.id()) {
                return true;
            }
            if ancestor_name.is_some_and(|a| BOILERPLATE_TAGS.contains(&a)) {
                return true;
            }
        }
        false
    }

    fn classify(&self, el: ElementRef) -> Option<Block> {
        let name = el.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<u8>().ok()?;
                let text = normalize(&element_text(*el, &[]));
                if text.is_empty() {
                    return None;
                }
                Some(Block::Heading { level, text })
            }
            "p" => Some(Block::Paragraph(element_text(*el, &[]))),
            "li" => Some(Block::ListItem {
                ordered: in_ordered_list(el),
                text: element_text(*el, &["ul", "ol"]),
            }),
            "table" => Some(Block::Table(table_rows(el))),
            "div" | "span" => {
                if has_block_descendant(el) {
                    return None;
                }
                let text = element_text(*el, &[]);
                if word_count(&text) < self.min_words {
                    return None;
                }
                Some(Block::Paragraph(text))
            }
            _ => None,
        }
    }
}

/// Text of the subtree with a space around block children and `<br>`.
/// Subtrees named in `skip` are left out.
fn element_text(node: NodeRef<Node>, skip: &[&str]) -> String {
    let mut out = String::new();
    push_text(node, skip, &mut out);
    out
}

fn push_text(node: NodeRef<Node>, skip: &[&str], out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                let name = e.name();
                if skip.contains(&name) || matches!(name, "script" | "style" | "noscript" | "template") {
                    continue;
                }
                let spaced = name == "br" || BLOCK_TAGS.contains(&name) || matches!(name, "td" | "th" | "tr");
                if spaced {
                    out.push(' ');
                }
                push_text(child, skip, out);
                if spaced {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn has_block_descendant(el: ElementRef) -> bool {
    el.descendants().skip(1).any(|n| {
        n.value()
            .as_element()
            .is_some_and(|e| BLOCK_TAGS.contains(&e.name()))
    })
}

fn in_ordered_list(el: ElementRef) -> bool {
    el.ancestors()
        .filter_map(|a| a.value().as_element().map(|e| e.name()))
        .find(|n| *n == "ol" || *n == "ul")
        .is_some_and(|n| n == "ol")
}

/// Rows that belong to this table, nested tables flattened into their cell.
fn table_rows(table: ElementRef) -> Vec<Vec<String>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "tr" && nearest_table(*e) == Some(table.id()))
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "td" | "th"))
                .map(|cell| normalize(&element_text(*cell, &[])))
                .collect()
        })
        .collect()
}

fn nearest_table(el: ElementRef) -> Option<NodeId> {
    el.ancestors()
        .find(|a| a.value().as_element().is_some_and(|e| e.name() == "table"))
        .map(|a| a.id())
}

/// `<title>`, or the first `<h1>` when the title is missing or blank.
pub fn page_title(document: &Html) -> Option<String> {
    let from = |sel: &Selector| {
        document
            .select(sel)
            .next()
            .map(|e| normalize(&e.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    };
    from(&TITLE_SEL).or_else(|| from(&H1_SEL))
}
