//! Configuration module for Site-Mapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags are applied on top of the loaded values by the binary.
//!
//! # Example
//!
//! ```no_run
//! use site_mapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-mapper.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_seed_url};
