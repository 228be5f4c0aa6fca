use crate::url::CanonicalUrl;
use std::collections::{HashMap, VecDeque};

/// Frontier and visited set for a single crawl
///
/// The visited set records every URL ever enqueued, in discovery order, with
/// the depth at which it was first seen. It is append-only and doubles as the
/// crawl result. The frontier holds the URLs still waiting to be fetched.
///
/// Invariant: every URL in the frontier is in the visited set, and no URL is
/// pushed onto the frontier more than once per crawl.
#[derive(Debug, Default)]
pub struct CrawlState {
    /// Visited URLs mapped to the depth they were discovered at
    depths: HashMap<CanonicalUrl, u32>,

    /// Visited URLs in discovery order
    order: Vec<CanonicalUrl>,

    /// URLs pending visitation
    frontier: VecDeque<CanonicalUrl>,

    /// Depth of the level that the next `dequeue_level` call returns
    level: u32,
}

impl CrawlState {
    /// Creates an empty crawl state
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a crawl state holding only the seed at depth 0
    pub fn with_seed(seed: CanonicalUrl) -> Self {
        let mut state = Self::new();
        state.enqueue_if_new(seed);
        state
    }

    /// Adds `url` to the visited set and the frontier unless already visited
    ///
    /// This is the single dedup gate: membership check and insertion happen
    /// together, so callers sharing the state behind a lock never enqueue the
    /// same URL twice.
    ///
    /// A URL enqueued while level `d` is being processed belongs to level
    /// `d + 1`.
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and has been enqueued
    /// * `false` - The URL was already visited
    pub fn enqueue_if_new(&mut self, url: CanonicalUrl) -> bool {
        if self.depths.contains_key(&url) {
            return false;
        }

        self.depths.insert(url.clone(), self.level);
        self.order.push(url.clone());
        self.frontier.push_back(url);
        true
    }

    /// Takes every URL of the current level off the frontier
    ///
    /// URLs enqueued after this call are kept for the next level.
    pub fn dequeue_level(&mut self) -> Vec<CanonicalUrl> {
        self.level += 1;
        self.frontier.drain(..).collect()
    }

    /// Returns whether `url` has been visited
    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        self.depths.contains_key(url)
    }

    /// Returns the depth at which `url` was first discovered
    pub fn depth_of(&self, url: &CanonicalUrl) -> Option<u32> {
        self.depths.get(url).copied()
    }

    /// Returns the number of visited URLs
    pub fn visited_len(&self) -> usize {
        self.order.len()
    }

    /// Returns the number of URLs waiting in the frontier
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_frontier_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Returns the visited URLs in discovery order
    pub fn visited(&self) -> &[CanonicalUrl] {
        &self.order
    }

    /// Consumes the state and returns the visited URLs in discovery order
    pub fn into_visited(self) -> Vec<CanonicalUrl> {
        self.order
    }
}
