//! State module for tracking crawl progress
//!
//! This module provides the state owned by a single crawl.
//!
//! # Components
//!
//! - `CrawlState`: the frontier of pending URLs plus the visited set
//! - `CrawlPhase`: the `Idle → Running → Done` lifecycle of a crawl

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_state::CrawlState;
