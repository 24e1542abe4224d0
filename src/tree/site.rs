use serde::{Deserialize, Serialize};
use url::Url;

/// One URL path segment of a crawled site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteNode {
    pub segment: String,
    pub title: String,
    /// Set only on nodes that correspond to a fetched page.
    pub source_url: Option<String>,
    pub children: Vec<SiteNode>,
}

/// A fetched page as the site tree sees it.
#[derive(Debug, Clone)]
pub struct SitePage {
    pub url: String,
    pub title: Option<String>,
}

impl SiteNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            title: segment.to_string(),
            source_url: None,
            children: Vec::new(),
        }
    }

    fn child_mut(&mut self, segment: &str) -> &mut SiteNode {
        match self.children.iter().position(|c| c.segment == segment) {
            Some(i) => &mut self.children[i],
            None => {
                self.children.push(SiteNode::new(segment));
                let last = self.children.len() - 1;
                &mut self.children[last]
            }
        }
    }

    pub fn find(&self, segments: &[&str]) -> Option<&SiteNode> {
        match segments.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .children
                .iter()
                .find(|c| c.segment == *head)
                .and_then(|c| c.find(rest)),
        }
    }

    /// Nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SiteNode::node_count).sum::<usize>()
    }
}

/// Group fetched pages under the seed by URL path segment. Intermediate
/// segments without a page of their own are titled by the segment.
pub fn build(seed: &Url, pages: &[SitePage]) -> SiteNode {
    let host = seed.host_str().unwrap_or_default().to_string();
    let mut root = SiteNode {
        segment: String::new(),
        title: host,
        source_url: Some(seed.to_string()),
        children: Vec::new(),
    };

    for page in pages {
        let Ok(url) = Url::parse(&page.url) else {
            continue;
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if url == *seed {
            if let Some(title) = &page.title {
                root.title = title.clone();
            }
            continue;
        }
        // other views of the root path (query strings) have no node of their own
        if segments.is_empty() {
            continue;
        }

        let mut node = &mut root;
        for seg in &segments {
            node = node.child_mut(seg);
        }
        node.source_url = Some(page.url.clone());
        if let Some(title) = &page.title {
            node.title = title.clone();
        }
    }

    root
}
