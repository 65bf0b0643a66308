//! Sitemap generation.
//!
//! Turns the routes of one build into sitemap documents:
//!
//! ```text
//! routes ──► ignore rules ──► resolve config ──► SitemapMaps ──► <output>/*.xml
//!                                                              └► <output>/robots.txt
//! ```
//!
//! ## Entries
//!
//! For each route that is not ignored:
//!
//! - **Location**: [`build_location`] joins the resolved `url_prefix` and the
//!   route with exactly one `/`, then appends a trailing `/` when requested.
//! - **Priority**: [`compute_priority`], a fixed value or a list indexed by
//!   route depth.
//! - **Last modified**: the resolved `last_mod`, else the build time. The build
//!   time is passed in, captured once per run.
//! - **Change frequency**: the resolved `change_freq`.
//!
//! ## Target Documents
//!
//! Each route lands in the document named by its resolved
//! `sitemap_filename`. The first route that targets a document decides how
//! it starts: with `merge`, from the document already in the output
//! directory (if any); otherwise empty. Entries of this run overwrite
//! merged entries at the same location; all other merged entries are kept.
//!
//! Two routes that produce the same location collapse into one entry, the
//! later route winning.

use crate::config::{PrioritySpec, SitemapConfig};
use crate::document::{self, DocumentError};
use crate::matcher::PatternError;
use crate::resolve::{self, ResolvedRouteConfig, RouteRules};
use crate::robots;
use crate::types::{SitemapEntry, SitemapMap, SitemapMaps};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Priority used when none is configured.
pub const DEFAULT_PRIORITY: &str = "0.5";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid route pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("Sitemap {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// Join `url_prefix` and `route` with exactly one `/`.
///
/// With `trailing_slash`, the result always ends in `/`.
pub fn build_location(url_prefix: &str, route: &str, trailing_slash: bool) -> String {
    let mut loc = match (url_prefix.ends_with('/'), route.starts_with('/')) {
        (true, true) => format!("{url_prefix}{}", &route[1..]),
        (false, false) => format!("{url_prefix}/{route}"),
        _ => format!("{url_prefix}{route}"),
    };
    if trailing_slash && !loc.ends_with('/') {
        loc.push('/');
    }
    loc
}

/// Number of non-empty `/`-separated segments: `/` is 0, `/a/b` is 2.
pub fn route_depth(route: &str) -> usize {
    route.split('/').filter(|segment| !segment.is_empty()).count()
}

/// Priority for `route` under `priority`.
///
/// A list is indexed by `depth - 1`; the root route uses the first value.
/// Routes deeper than the list get `None`.
pub fn compute_priority(route: &str, priority: Option<&PrioritySpec>) -> Option<String> {
    match priority {
        Some(PrioritySpec::Single(value)) => Some(value.clone()),
        Some(PrioritySpec::ByDepth(values)) => {
            let index = route_depth(route).saturating_sub(1);
            values.get(index).cloned()
        }
        None => Some(DEFAULT_PRIORITY.to_string()),
    }
}

/// Format the build time the way `<lastmod>` carries it.
pub fn format_lastmod(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// What happens to one route.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePlan<'a> {
    Ignored {
        route: &'a str,
    },
    Included {
        route: &'a str,
        resolved: ResolvedRouteConfig<'a>,
        loc: String,
        priority: Option<String>,
    },
}

/// Classify one route: ignored, or the location and priority it gets.
pub fn plan_route<'a>(
    route: &'a str,
    config: &'a SitemapConfig,
    rules: &'a RouteRules,
) -> RoutePlan<'a> {
    if rules.is_ignored(route) {
        return RoutePlan::Ignored { route };
    }
    let resolved = resolve::resolve(config, rules, route);
    let loc = build_location(resolved.url_prefix, route, resolved.trailing_slash);
    let priority = compute_priority(route, resolved.priority);
    RoutePlan::Included {
        route,
        resolved,
        loc,
        priority,
    }
}

/// Plan every route without touching the filesystem.
pub fn plan_routes<'a>(
    routes: &'a [String],
    config: &'a SitemapConfig,
    rules: &'a RouteRules,
) -> Vec<RoutePlan<'a>> {
    routes
        .iter()
        .map(|route| plan_route(route, config, rules))
        .collect()
}

fn initial_map(
    output_dir: &Path,
    filename: &str,
    merge: bool,
) -> Result<SitemapMap, GenerateError> {
    if !merge {
        return Ok(SitemapMap::new());
    }
    let path = output_dir.join(filename);
    let existing = document::load_document(&path)
        .map_err(|source| GenerateError::Document { path, source })?;
    Ok(existing.unwrap_or_default())
}

/// Build one map per target document from the routes of this run.
///
/// `now` fills `<lastmod>` for routes without a configured value.
pub fn build_maps(
    routes: &[String],
    config: &SitemapConfig,
    rules: &RouteRules,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<SitemapMaps, GenerateError> {
    let now = format_lastmod(now);
    let mut maps = SitemapMaps::new();

    for route in routes {
        let RoutePlan::Included {
            resolved,
            loc,
            priority,
            ..
        } = plan_route(route, config, rules)
        else {
            continue;
        };

        let map = maps.get_or_try_insert_with(resolved.sitemap_filename, || {
            initial_map(output_dir, resolved.sitemap_filename, resolved.merge)
        })?;
        map.insert(SitemapEntry {
            loc,
            changefreq: Some(resolved.change_freq),
            lastmod: Some(resolved.last_mod.unwrap_or(now.as_str()).to_string()),
            priority,
        });
    }

    Ok(maps)
}

/// A document written by [`write_maps`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenSitemap {
    pub filename: String,
    pub path: PathBuf,
    pub entries: usize,
}

/// Write every map to `<output_dir>/<filename>`.
pub fn write_maps(
    maps: &SitemapMaps,
    output_dir: &Path,
) -> Result<Vec<WrittenSitemap>, GenerateError> {
    maps.iter()
        .map(|(filename, map)| -> Result<WrittenSitemap, GenerateError> {
            let path = output_dir.join(filename);
            let entries = document::write_document(map, &path).map_err(|source| {
                GenerateError::Document {
                    path: path.clone(),
                    source,
                }
            })?;
            Ok(WrittenSitemap {
                filename: filename.to_string(),
                path,
                entries,
            })
        })
        .collect()
}

/// Outcome of one run, for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Number of routes handed in; `None` when the host found no routes.
    pub route_count: Option<usize>,
    pub ignored: usize,
    pub sitemaps: Vec<WrittenSitemap>,
    pub robots: Option<PathBuf>,
}

/// Run the whole pipeline for one build.
///
/// `routes` is `None` when the host discovered no routes at all; that is
/// a no-op, not an error. The output directory must already exist.
pub fn run(
    routes: Option<&[String]>,
    config: &SitemapConfig,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<BuildReport, GenerateError> {
    let Some(routes) = routes else {
        return Ok(BuildReport::default());
    };

    let rules = RouteRules::compile(config)?;
    let ignored = routes.iter().filter(|r| rules.is_ignored(r)).count();
    let maps = build_maps(routes, config, &rules, output_dir, now)?;
    let sitemaps = write_maps(&maps, output_dir)?;

    let robots = if config.create_robots_file {
        Some(robots::write_robots(config, output_dir)?)
    } else {
        None
    };

    Ok(BuildReport {
        route_count: Some(routes.len()),
        ignored,
        sitemaps,
        robots,
    })
}
