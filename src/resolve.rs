//! Per-route configuration resolution.
//!
//! [`RouteRules`] compiles the override patterns and ignore list of a
//! [`SitemapConfig`] once per run. [`resolve`] then layers the first
//! matching override over the top-level settings for each route.

use crate::config::{IgnoreRule, PrioritySpec, RouteOverride, SitemapConfig};
use crate::matcher::{PatternError, RouteMatcher};
use crate::types::ChangeFreq;
use regex::Regex;

/// Compiled form of an `ignored_routes` entry.
#[derive(Debug, Clone)]
enum IgnoreMatcher {
    Exact(String),
    Pattern(RouteMatcher),
    Regex(Regex),
}

impl IgnoreMatcher {
    fn compile(rule: &IgnoreRule) -> Result<Self, PatternError> {
        Ok(match rule {
            IgnoreRule::Exact(route) => IgnoreMatcher::Exact(route.clone()),
            IgnoreRule::Pattern { pattern } => {
                IgnoreMatcher::Pattern(RouteMatcher::compile(pattern)?)
            }
            IgnoreRule::Regex { regex } => {
                IgnoreMatcher::Regex(Regex::new(regex).map_err(|source| PatternError::Regex {
                    pattern: regex.clone(),
                    source,
                })?)
            }
        })
    }

    fn is_match(&self, route: &str) -> bool {
        match self {
            IgnoreMatcher::Exact(exact) => exact == route,
            IgnoreMatcher::Pattern(matcher) => matcher.is_match(route),
            IgnoreMatcher::Regex(regex) => regex.is_match(route),
        }
    }
}

/// Override patterns and ignore rules, compiled once per run.
#[derive(Debug, Clone)]
pub struct RouteRules {
    overrides: Vec<(RouteMatcher, RouteOverride)>,
    ignores: Vec<IgnoreMatcher>,
}

impl RouteRules {
    pub fn compile(config: &SitemapConfig) -> Result<Self, PatternError> {
        let overrides = config
            .routes
            .iter()
            .map(|route| -> Result<_, PatternError> {
                Ok((RouteMatcher::compile(&route.pattern)?, route.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ignores = config
            .ignored_routes
            .iter()
            .map(IgnoreMatcher::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { overrides, ignores })
    }

    /// Whether any ignore rule matches the route.
    pub fn is_ignored(&self, route: &str) -> bool {
        self.ignores.iter().any(|rule| rule.is_match(route))
    }

    /// The first override, in table order, whose pattern matches the route.
    pub fn matching_override(&self, route: &str) -> Option<&RouteOverride> {
        self.overrides
            .iter()
            .find(|(matcher, _)| matcher.is_match(route))
            .map(|(_, route_override)| route_override)
    }
}

/// Effective settings for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRouteConfig<'a> {
    pub url_prefix: &'a str,
    pub trailing_slash: bool,
    pub sitemap_filename: &'a str,
    pub merge: bool,
    pub change_freq: ChangeFreq,
    pub priority: Option<&'a PrioritySpec>,
    pub last_mod: Option<&'a str>,
}

impl<'a> ResolvedRouteConfig<'a> {
    /// The top-level settings, unchanged.
    pub fn from_global(config: &'a SitemapConfig) -> Self {
        Self {
            url_prefix: &config.url_prefix,
            trailing_slash: config.trailing_slash,
            sitemap_filename: &config.sitemap_filename,
            merge: config.merge,
            change_freq: config.change_freq.clone(),
            priority: config.priority.as_ref(),
            last_mod: config.last_mod.as_deref(),
        }
    }

    /// Layer an override on top. With `truthy`, an override value of
    /// `false` or `""` counts as absent.
    fn overlay(self, route: &'a RouteOverride, truthy: bool) -> Self {
        let text = |value: Option<&'a String>| {
            value
                .map(String::as_str)
                .filter(|s| !(truthy && s.is_empty()))
        };
        let flag = |value: Option<bool>| value.filter(|b| !(truthy && !b));
        let priority = route.priority.as_ref().filter(|p| {
            !(truthy && matches!(p, PrioritySpec::Single(s) if s.is_empty()))
        });

        Self {
            url_prefix: text(route.url_prefix.as_ref()).unwrap_or(self.url_prefix),
            trailing_slash: flag(route.trailing_slash).unwrap_or(self.trailing_slash),
            sitemap_filename: text(route.sitemap_filename.as_ref())
                .unwrap_or(self.sitemap_filename),
            merge: flag(route.merge).unwrap_or(self.merge),
            change_freq: route.change_freq.clone().unwrap_or(self.change_freq),
            priority: priority.or(self.priority),
            last_mod: text(route.last_mod.as_ref()).or(self.last_mod),
        }
    }
}

/// Resolve the effective settings for `route`.
///
/// Only the first matching override applies. Without a match the
/// top-level settings are returned verbatim.
pub fn resolve<'a>(
    config: &'a SitemapConfig,
    rules: &'a RouteRules,
    route: &str,
) -> ResolvedRouteConfig<'a> {
    let global = ResolvedRouteConfig::from_global(config);
    match rules.matching_override(route) {
        Some(route_override) => global.overlay(route_override, config.legacy_quirks),
        None => global,
    }
}
