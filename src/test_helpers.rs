//! Shared test utilities for the route-sitemap test suite.
//!
//! Lookup helpers panic with the available keys on a miss, so a failing
//! assertion says what was there instead.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let maps = build_maps(&route_list(&["/", "/about"]), &config, &rules, dir, fixed_now())?;
//! let entry = find_entry(map_for(&maps, "sitemap.xml"), "http://localhost/about");
//! assert_eq!(entry.priority.as_deref(), Some("0.5"));
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

use crate::document::SITEMAP_NS;
use crate::types::{SitemapEntry, SitemapMap, SitemapMaps};

// =========================================================================
// Inputs
// =========================================================================

/// The build time every test run pretends to start at.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

pub fn route_list(routes: &[&str]) -> Vec<String> {
    routes.iter().map(|r| r.to_string()).collect()
}

/// Write a minimal sitemap document as a previous build would have left it.
pub fn write_existing_sitemap(dir: &Path, filename: &str, entries: &[(&str, &str)]) {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"{SITEMAP_NS}\">\n"
    );
    for (loc, priority) in entries {
        xml.push_str(&format!(
            "  <url>\n    <loc>{loc}</loc>\n    <changefreq>monthly</changefreq>\n    \
             <lastmod>2020-01-01</lastmod>\n    <priority>{priority}</priority>\n  </url>\n"
        ));
    }
    xml.push_str("</urlset>\n");
    std::fs::write(dir.join(filename), xml).unwrap();
}

// =========================================================================
// Lookups
// =========================================================================

/// Find the map for a document filename. Panics if not found.
pub fn map_for<'a>(maps: &'a SitemapMaps, filename: &str) -> &'a SitemapMap {
    maps.get(filename).unwrap_or_else(|| {
        panic!(
            "sitemap '{filename}' not found. Available: {:?}",
            maps.filenames()
        )
    })
}

/// Find an entry by location. Panics if not found.
pub fn find_entry<'a>(map: &'a SitemapMap, loc: &str) -> &'a SitemapEntry {
    map.get(loc)
        .unwrap_or_else(|| panic!("entry '{loc}' not found. Available: {:?}", map.locations()))
}
