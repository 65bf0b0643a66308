//! # Route Sitemap
//!
//! Sitemap generation for statically rendered sites. After a static build,
//! the host hands over the list of routes it rendered; this crate turns them
//! into one or more [sitemaps.org](https://www.sitemaps.org/protocol.html)
//! XML documents, and optionally a `robots.txt` pointing at the primary one.
//!
//! # Pipeline
//!
//! ```text
//! 1. Config    sitemap.toml  →  SitemapConfig   (stock defaults + user file, validated)
//! 2. Rules     SitemapConfig →  RouteRules      (compiled patterns and ignore rules)
//! 3. Build     routes        →  SitemapMaps     (one map per target document)
//! 4. Write     SitemapMaps   →  <output>/*.xml  (+ robots.txt)
//! ```
//!
//! Steps 2 and 3 are pure apart from reading documents that are merged into,
//! so most behavior is tested without touching the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `sitemap.toml` loading, stock defaults, merging, and validation |
//! | [`matcher`] | Route patterns (`/blog/:slug`, `/docs/*`) compiled to regexes |
//! | [`resolve`] | Ignore rules and per-route overrides layered on the global config |
//! | [`generate`] | Locations, priorities, and the per-document maps; the whole run |
//! | [`document`] | Reading and writing sitemap XML |
//! | [`robots`] | The `robots.txt` body |
//! | [`routes`] | Route list input (JSON or plain lines) |
//! | [`types`] | `SitemapEntry`, `SitemapMap`, `SitemapMaps`, `ChangeFreq` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Ordered Overrides
//!
//! Per-route settings are an ordered list of `[[routes]]` tables, each with a
//! `pattern`. The first matching table applies; nothing else is consulted.
//! A field set in the table wins even when it is `false`, `0` or empty;
//! unset fields fall back to the top-level value.
//!
//! ## Insertion-Ordered Maps
//!
//! Entries keep the order their routes were handed in, and documents keep the
//! order they were first targeted. Replacing an entry at an existing location
//! keeps its position, so merging the same build twice produces the same file.
//!
//! ## Build Time Is an Input
//!
//! `now` is captured once by the caller and passed in. Every entry without a
//! configured `last_mod` carries the same timestamp, and tests stay
//! deterministic.

pub mod config;
pub mod document;
pub mod generate;
pub mod matcher;
pub mod output;
pub mod resolve;
pub mod robots;
pub mod routes;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
