use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Discovered-but-unfetched URLs with their hop count, plus everything that
/// has already been handed out for fetching.
#[derive(Debug, Default)]
pub struct CrawlFrontier {
    to_visit: HashMap<String, usize>,
    visited: HashSet<String>,
}

impl CrawlFrontier {
    /// Queue `url` at `depth` unless it is already queued or visited.
    pub fn enqueue(&mut self, url: &str, depth: usize) -> bool {
        if self.visited.contains(url) || self.to_visit.contains_key(url) {
            return false;
        }
        self.to_visit.insert(url.to_string(), depth);
        true
    }

    /// Move every queued URL at `depth` to the visited set and return them.
    pub fn take_depth(&mut self, depth: usize) -> Vec<String> {
        let mut taken: Vec<String> = self
            .to_visit
            .iter()
            .filter(|(_, d)| **d == depth)
            .map(|(u, _)| u.clone())
            .collect();
        taken.sort();
        for url in &taken {
            self.to_visit.remove(url);
            self.visited.insert(url.clone());
        }
        taken
    }

    /// Move everything still queued to the visited set.
    pub fn take_all(&mut self) -> Vec<(String, usize)> {
        let mut taken: Vec<(String, usize)> = self.to_visit.drain().collect();
        taken.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        for (url, _) in &taken {
            self.visited.insert(url.clone());
        }
        taken
    }

    /// Record a URL reached without being queued (a redirect target) so it
    /// is never fetched again. Drops it from the queue if present.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.to_visit.remove(url);
        self.visited.insert(url.to_string())
    }

    pub fn depth_of(&self, url: &str) -> Option<usize> {
        self.to_visit.get(url).copied()
    }

    #[cfg(test)]
    pub fn max_queued_depth(&self) -> Option<usize> {
        self.to_visit.values().copied().max()
    }

    #[cfg(test)]
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn queued(&self) -> usize {
        self.to_visit.len()
    }

    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

/// Frontier shared between link-discovery workers of one crawl.
#[derive(Debug)]
pub struct CrawlState {
    frontier: Mutex<CrawlFrontier>,
    max_depth: usize,
}

impl CrawlState {
    pub fn new(seed: &str, max_depth: usize) -> Self {
        let mut frontier = CrawlFrontier::default();
        frontier.enqueue(seed, 0);
        Self {
            frontier: Mutex::new(frontier),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check-then-insert under one lock acquisition. URLs beyond the depth
    /// bound are refused.
    pub fn enqueue(&self, url: &str, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        self.lock().enqueue(url, depth)
    }

    pub fn take_depth(&self, depth: usize) -> Vec<String> {
        self.lock().take_depth(depth)
    }

    pub fn take_all(&self) -> Vec<(String, usize)> {
        self.lock().take_all()
    }

    pub fn mark_visited(&self, url: &str) -> bool {
        self.lock().mark_visited(url)
    }

    pub fn with_frontier<T>(&self, f: impl FnOnce(&CrawlFrontier) -> T) -> T {
        f(&self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CrawlFrontier> {
        self.frontier.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
