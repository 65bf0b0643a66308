//! robots.txt generation.
//!
//! Written once per run when `create_robots_file` is set:
//!
//! ```text
//! User-agent: *
//! Allow: /
//!
//! Sitemap: http://localhost/sitemap.xml
//! ```
//!
//! The sitemap URL always uses the top-level `url_prefix` and
//! `sitemap_filename`; route overrides do not affect it.

use crate::config::SitemapConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub const ROBOTS_FILENAME: &str = "robots.txt";

/// Absolute URL of the primary sitemap.
pub fn sitemap_url(config: &SitemapConfig) -> String {
    let prefix = config.url_prefix.as_str();
    let prefix = match prefix.strip_suffix('/') {
        // Inherited behavior: one character too many is cut.
        Some(_) if config.legacy_quirks => {
            let mut chars = prefix.chars();
            chars.next_back();
            chars.next_back();
            chars.as_str()
        }
        Some(trimmed) => trimmed,
        None => prefix,
    };
    format!("{prefix}/{}", config.sitemap_filename)
}

/// The robots.txt body.
pub fn robots_content(config: &SitemapConfig) -> String {
    let allow_all = ["User-agent: *", "Allow: /"].join("\n");
    let groups = [allow_all, format!("Sitemap: {}", sitemap_url(config))];
    groups.join("\n\n")
}

/// Write `robots.txt` into `output_dir`, replacing any existing file.
pub fn write_robots(config: &SitemapConfig, output_dir: &Path) -> std::io::Result<PathBuf> {
    let path = output_dir.join(ROBOTS_FILENAME);
    fs::write(&path, robots_content(config))?;
    Ok(path)
}
