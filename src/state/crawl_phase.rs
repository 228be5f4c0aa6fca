//! Crawl phase definitions
//!
//! A crawl moves through `Idle → Running → Done`, one `Running` step per
//! breadth-first level.

use std::fmt;

/// Represents where a crawl is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// No traversal has started
    Idle,

    /// The level at `depth` is being processed
    Running { depth: u32 },

    /// Traversal finished: the depth bound was passed or the frontier emptied
    Done,
}

impl CrawlPhase {
    /// Returns true once the crawl can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the depth being processed, if running
    pub fn depth(&self) -> Option<u32> {
        match self {
            Self::Running { depth } => Some(*depth),
            _ => None,
        }
    }

    /// Decides the phase for the next level
    ///
    /// Levels `0..=max_depth` are processed; the crawl is done as soon as the
    /// frontier is empty or the depth bound is passed.
    pub fn next(depth: u32, max_depth: u32, frontier_empty: bool) -> Self {
        if frontier_empty || depth > max_depth {
            Self::Done
        } else {
            Self::Running { depth }
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { depth } => write!(f, "running (depth {})", depth),
            Self::Done => write!(f, "done"),
        }
    }
}
