//! Sitemap configuration module.
//!
//! Handles loading, validating, and merging `sitemap.toml`. Stock defaults
//! are serialized to a TOML table and the user's file is merged on top, so
//! a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! url_prefix = "http://localhost"   # Base URL every route is joined to
//! sitemap_filename = "sitemap.xml"  # Default target document
//! create_robots_file = false        # Also write robots.txt
//! merge = false                     # Keep entries of an existing document
//! change_freq = "monthly"           # always|hourly|daily|weekly|monthly|yearly|never
//! priority = "0.5"                  # Or a list indexed by route depth
//! # last_mod = "2024-05-01"         # Defaults to the build time
//! trailing_slash = false            # Append `/` to every location
//! suppress_log = false              # Silence status output
//! legacy_quirks = false             # Reproduce inherited edge behaviors
//!
//! ignored_routes = ["/404", { pattern = "/drafts/:slug" }, { regex = "^/tmp" }]
//!
//! [[routes]]
//! pattern = "/blog/:slug"
//! sitemap_filename = "sitemap-blog.xml"
//! change_freq = "weekly"
//! priority = ["1.0", "0.8", "0.6"]
//! ```
//!
//! ## Route Overrides
//!
//! `[[routes]]` is an ordered list. For every route the first entry whose
//! `pattern` matches is applied; later matches are ignored. Each field of
//! an override is optional and falls back to the top-level value.
//!
//! Unknown keys are rejected to catch typos early.

use crate::matcher::PatternError;
use crate::resolve::RouteRules;
use crate::types::ChangeFreq;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILENAME: &str = "sitemap.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid route pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Priority for a route: one value for every route, or a list indexed by
/// the route's depth (`/` and `/about` use the first value, `/a/b` the
/// second, and so on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrioritySpec {
    Single(String),
    ByDepth(Vec<String>),
}

impl PrioritySpec {
    fn values(&self) -> Vec<&str> {
        match self {
            PrioritySpec::Single(value) => vec![value.as_str()],
            PrioritySpec::ByDepth(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// An entry of `ignored_routes`.
///
/// A plain string must equal the route exactly. `pattern` uses the route
/// pattern syntax of [`crate::matcher`]; `regex` is searched anywhere in
/// the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IgnoreRule {
    Exact(String),
    Pattern { pattern: String },
    Regex { regex: String },
}

/// Site-wide sitemap configuration loaded from `sitemap.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    /// Base URL every route is joined to.
    pub url_prefix: String,
    /// Document that routes without an override are written to.
    pub sitemap_filename: String,
    /// Write `robots.txt` pointing at the default sitemap.
    pub create_robots_file: bool,
    /// Seed each document from the copy already in the output directory.
    pub merge: bool,
    pub change_freq: ChangeFreq,
    /// Absent means every entry gets `0.5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<PrioritySpec>,
    /// Fixed `<lastmod>`; absent means the build time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_mod: Option<String>,
    /// Routes that never appear in any sitemap.
    pub ignored_routes: Vec<IgnoreRule>,
    /// Append `/` to every location that lacks one.
    pub trailing_slash: bool,
    /// Ordered per-route overrides; first match wins.
    pub routes: Vec<RouteOverride>,
    /// Silence status output.
    pub suppress_log: bool,
    /// Reproduce inherited edge behaviors: falsy override values fall back
    /// to the top-level value, and the robots.txt prefix loses two
    /// characters when it ends with `/`.
    pub legacy_quirks: bool,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            url_prefix: "http://localhost".to_string(),
            sitemap_filename: "sitemap.xml".to_string(),
            create_robots_file: false,
            merge: false,
            change_freq: ChangeFreq::Monthly,
            priority: Some(PrioritySpec::Single("0.5".to_string())),
            last_mod: None,
            ignored_routes: Vec::new(),
            trailing_slash: false,
            routes: Vec::new(),
            suppress_log: false,
            legacy_quirks: false,
        }
    }
}

/// Per-route settings applied when `pattern` matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteOverride {
    /// Route pattern, e.g. `/blog/:slug`.
    pub pattern: String,
    pub url_prefix: Option<String>,
    pub trailing_slash: Option<bool>,
    pub sitemap_filename: Option<String>,
    pub merge: Option<bool>,
    pub change_freq: Option<ChangeFreq>,
    pub priority: Option<PrioritySpec>,
    pub last_mod: Option<String>,
}

impl RouteOverride {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }
}

impl SitemapConfig {
    /// Validate values and compile every pattern once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url_prefix("url_prefix", &self.url_prefix)?;
        validate_filename("sitemap_filename", &self.sitemap_filename)?;
        if let Some(priority) = &self.priority {
            validate_priority("priority", priority)?;
        }
        if let Some(last_mod) = &self.last_mod {
            validate_last_mod("last_mod", last_mod)?;
        }

        for route in &self.routes {
            let at = |field: &str| format!("routes[{}].{field}", route.pattern);
            if let Some(prefix) = override_text(&route.url_prefix, self.legacy_quirks) {
                validate_url_prefix(&at("url_prefix"), prefix)?;
            }
            if let Some(filename) = override_text(&route.sitemap_filename, self.legacy_quirks) {
                validate_filename(&at("sitemap_filename"), filename)?;
            }
            let priority = route.priority.as_ref().filter(|p| {
                !(self.legacy_quirks && matches!(p, PrioritySpec::Single(v) if v.is_empty()))
            });
            if let Some(priority) = priority {
                validate_priority(&at("priority"), priority)?;
            }
            if let Some(last_mod) = override_text(&route.last_mod, self.legacy_quirks) {
                validate_last_mod(&at("last_mod"), last_mod)?;
            }
        }

        RouteRules::compile(self)?;
        Ok(())
    }
}

/// An override string that takes effect; under `legacy_quirks` an empty
/// string counts as unset.
fn override_text(value: &Option<String>, legacy_quirks: bool) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !(legacy_quirks && v.is_empty()))
}

fn validate_url_prefix(field: &str, prefix: &str) -> Result<(), ConfigError> {
    if prefix.starts_with("http://") || prefix.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::Validation(format!(
        "{field} must start with http:// or https:// (got '{prefix}')"
    )))
}

fn validate_filename(field: &str, filename: &str) -> Result<(), ConfigError> {
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(ConfigError::Validation(format!(
            "{field} must be a file name (got '{filename}')"
        )));
    }
    if filename.contains(['/', '\\']) {
        return Err(ConfigError::Validation(format!(
            "{field} must not contain path separators (got '{filename}')"
        )));
    }
    Ok(())
}

fn validate_priority(field: &str, priority: &PrioritySpec) -> Result<(), ConfigError> {
    let values = priority.values();
    if values.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{field} list must not be empty"
        )));
    }
    for value in values {
        match value.trim().parse::<f32>() {
            Ok(p) if (0.0..=1.0).contains(&p) => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "{field} values must be decimals between 0.0 and 1.0 (got '{value}')"
                )));
            }
        }
    }
    Ok(())
}

fn validate_last_mod(field: &str, last_mod: &str) -> Result<(), ConfigError> {
    let is_datetime = DateTime::parse_from_rfc3339(last_mod).is_ok();
    let is_date = NaiveDate::parse_from_str(last_mod, "%Y-%m-%d").is_ok();
    if is_datetime || is_date {
        return Ok(());
    }
    Err(ConfigError::Validation(format!(
        "{field} must be an RFC 3339 datetime or YYYY-MM-DD date (got '{last_mod}')"
    )))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SitemapConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SitemapConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SitemapConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`.
///
/// A missing file yields the stock defaults. User values are merged on top
/// of the defaults, unknown keys are rejected, and the result is validated.
pub fn load_config(path: &Path) -> Result<SitemapConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `sitemap.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Route Sitemap Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Base URL every route is joined to. Exactly one `/` separates the prefix
# from the route, whatever either side ends or starts with.
url_prefix = "http://localhost"

# Document that routes without an override are written to, relative to the
# output directory. Also the document referenced from robots.txt.
sitemap_filename = "sitemap.xml"

# Write robots.txt (allow everything, point at the sitemap).
create_robots_file = false

# Keep entries of the document already in the output directory. Entries for
# routes of this build replace old entries at the same location.
merge = false

# How often pages change: always, hourly, daily, weekly, monthly, yearly, never.
change_freq = "monthly"

# Priority of every entry. A list is indexed by route depth:
#   priority = ["1.0", "0.8", "0.6"]   # /about -> 1.0, /a/b -> 0.8, /a/b/c -> 0.6
# Routes deeper than the list get an empty <priority/>.
priority = "0.5"

# Fixed <lastmod> (RFC 3339 datetime or YYYY-MM-DD). Defaults to the build time.
# last_mod = "2024-05-01"

# Append `/` to every location that lacks one.
trailing_slash = false

# Silence status output.
suppress_log = false

# Reproduce inherited edge behaviors:
#  - an override set to false or "" falls back to the top-level value
#  - a url_prefix ending in `/` loses two characters in robots.txt
legacy_quirks = false

# Routes to leave out. Plain strings match exactly; `pattern` uses route
# patterns (`/drafts/:slug`, `/files/:path*`); `regex` matches anywhere.
ignored_routes = []
# ignored_routes = ["/404", { pattern = "/drafts/:slug" }, { regex = "^/tmp" }]

# ---------------------------------------------------------------------------
# Route overrides
# ---------------------------------------------------------------------------
# Checked in order; the first matching pattern wins. Every field except
# `pattern` is optional and falls back to the value above.
#
# [[routes]]
# pattern = "/blog/:slug"
# url_prefix = "https://blog.example.com"
# sitemap_filename = "sitemap-blog.xml"
# merge = true
# change_freq = "weekly"
# priority = ["1.0", "0.8", "0.6"]
# trailing_slash = true
# last_mod = "2024-05-01T10:00:00Z"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(tmp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_config_values() {
        let config = SitemapConfig::default();
        assert_eq!(config.url_prefix, "http://localhost");
        assert_eq!(config.sitemap_filename, "sitemap.xml");
        assert!(!config.create_robots_file);
        assert!(!config.merge);
        assert_eq!(config.change_freq, ChangeFreq::Monthly);
        assert_eq!(
            config.priority,
            Some(PrioritySpec::Single("0.5".to_string()))
        );
        assert!(!config.suppress_log);
        assert!(!config.trailing_slash);
        assert!(!config.legacy_quirks);
    }

    #[test]
    fn default_config_is_valid() {
        SitemapConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let config: SitemapConfig = toml::from_str(r#"url_prefix = "https://example.com""#).unwrap();
        assert_eq!(config.url_prefix, "https://example.com");
        assert_eq!(config.sitemap_filename, "sitemap.xml");
    }

    #[test]
    fn parse_priority_list() {
        let config: SitemapConfig = toml::from_str(r#"priority = ["1.0", "0.8"]"#).unwrap();
        assert_eq!(
            config.priority,
            Some(PrioritySpec::ByDepth(vec!["1.0".into(), "0.8".into()]))
        );
    }

    #[test]
    fn parse_ignore_rules() {
        let toml = r#"
ignored_routes = ["/404", { pattern = "/drafts/:slug" }, { regex = "^/tmp" }]
"#;
        let config: SitemapConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.ignored_routes,
            vec![
                IgnoreRule::Exact("/404".into()),
                IgnoreRule::Pattern {
                    pattern: "/drafts/:slug".into()
                },
                IgnoreRule::Regex {
                    regex: "^/tmp".into()
                },
            ]
        );
    }

    #[test]
    fn parse_route_overrides_in_order() {
        let toml = r#"
[[routes]]
pattern = "/blog/:slug"
change_freq = "weekly"

[[routes]]
pattern = "/blog/*"
sitemap_filename = "blog.xml"
"#;
        let config: SitemapConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].pattern, "/blog/:slug");
        assert_eq!(config.routes[0].change_freq, Some(ChangeFreq::Weekly));
        assert_eq!(config.routes[0].sitemap_filename, None);
        assert_eq!(config.routes[1].sitemap_filename.as_deref(), Some("blog.xml"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<SitemapConfig, _> = toml::from_str("urlPrefix = \"http://x\"");
        assert!(result.is_err());

        let result: Result<SitemapConfig, _> =
            toml::from_str("[[routes]]\npattern = \"/\"\nurlPrefix = \"http://x\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_change_freq_is_rejected() {
        let result: Result<SitemapConfig, _> = toml::from_str("change_freq = \"sometimes\"");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_relative_prefix() {
        let config = SitemapConfig {
            url_prefix: "example.com".into(),
            ..SitemapConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_filename_with_separator() {
        let config = SitemapConfig {
            sitemap_filename: "maps/sitemap.xml".into(),
            ..SitemapConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_priority() {
        let config = SitemapConfig {
            priority: Some(PrioritySpec::ByDepth(vec!["1.0".into(), "1.5".into()])),
            ..SitemapConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("1.5"), "{err}");
    }

    #[test]
    fn validate_rejects_empty_priority_list() {
        let config = SitemapConfig {
            priority: Some(PrioritySpec::ByDepth(vec![])),
            ..SitemapConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_accepts_date_and_datetime_last_mod() {
        for last_mod in ["2024-05-01", "2024-05-01T10:00:00Z", "2024-05-01T10:00:00.000+02:00"] {
            let config = SitemapConfig {
                last_mod: Some(last_mod.into()),
                ..SitemapConfig::default()
            };
            config.validate().unwrap();
        }
    }

    #[test]
    fn validate_rejects_bad_last_mod() {
        let config = SitemapConfig {
            last_mod: Some("yesterday".into()),
            ..SitemapConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_checks_override_fields() {
        let config = SitemapConfig {
            routes: vec![RouteOverride {
                sitemap_filename: Some(String::new()),
                ..RouteOverride::new("/blog/:slug")
            }],
            ..SitemapConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("routes[/blog/:slug].sitemap_filename"), "{err}");
    }

    #[test]
    fn legacy_quirks_allow_empty_override_strings() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
legacy_quirks = true

[[routes]]
pattern = "/docs/*"
url_prefix = ""
sitemap_filename = ""
last_mod = ""
priority = ""
"#,
        );
        let config = load_config(&path).unwrap();
        let rules = RouteRules::compile(&config).unwrap();
        let resolved = crate::resolve::resolve(&config, &rules, "/docs/intro");

        assert_eq!(resolved.url_prefix, "http://localhost");
        assert_eq!(resolved.sitemap_filename, "sitemap.xml");
        assert_eq!(resolved.last_mod, None);
        assert_eq!(resolved.priority, config.priority.as_ref());
    }

    #[test]
    fn empty_override_strings_are_rejected_without_legacy_quirks() {
        let config = SitemapConfig {
            routes: vec![RouteOverride {
                url_prefix: Some(String::new()),
                ..RouteOverride::new("/docs/*")
            }],
            ..SitemapConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("routes[/docs/*].url_prefix"), "{err}");
    }

    #[test]
    fn validate_compiles_patterns() {
        let config = SitemapConfig {
            routes: vec![RouteOverride::new("/blog/:")],
            ..SitemapConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Pattern(_))));

        let config = SitemapConfig {
            ignored_routes: vec![IgnoreRule::Regex {
                regex: "(".into(),
            }],
            ..SitemapConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Pattern(_))));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.url_prefix, "http://localhost");
        assert!(config.routes.is_empty());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
url_prefix = "https://example.com"
create_robots_file = true

[[routes]]
pattern = "/blog/:slug"
priority = "0.9"
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.url_prefix, "https://example.com");
        assert!(config.create_robots_file);
        assert_eq!(
            config.routes[0].priority,
            Some(PrioritySpec::Single("0.9".into()))
        );
        // Unspecified values should be defaults
        assert_eq!(config.sitemap_filename, "sitemap.xml");
        assert_eq!(config.change_freq, ChangeFreq::Monthly);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "this is not valid toml [[[");

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, r#"priority = "2""#);

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn merge_toml_overlay_wins_and_base_survives() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").and_then(|v| v.as_integer()), Some(1));
        assert_eq!(merged.get("b").and_then(|v| v.as_integer()), Some(3));
    }

    #[test]
    fn merge_toml_replaces_arrays() {
        let base: toml::Value = toml::from_str("priority = [\"1.0\", \"0.5\"]").unwrap();
        let overlay: toml::Value = toml::from_str("priority = [\"0.3\"]").unwrap();
        let merged = merge_toml(base, overlay);
        let items = merged.get("priority").and_then(|v| v.as_array()).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: SitemapConfig = toml::from_str(stock_config_toml()).unwrap();
        let default = SitemapConfig::default();
        assert_eq!(config.url_prefix, default.url_prefix);
        assert_eq!(config.sitemap_filename, default.sitemap_filename);
        assert_eq!(config.change_freq, default.change_freq);
        assert_eq!(config.priority, default.priority);
        assert_eq!(config.merge, default.merge);
        assert!(config.routes.is_empty());
        assert!(config.ignored_routes.is_empty());
    }
}
