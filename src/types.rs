//! Shared types used across the resolver, builder, and document writer.
//!
//! A run produces one [`SitemapMap`] per target filename. Maps keep their
//! entries in insertion order so the written document lists merged entries
//! first, followed by new locations in route order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How often a page is expected to change (`<changefreq>`).
///
/// `Other` only comes from merged documents: a value outside the standard
/// seven is kept verbatim and written back unchanged. Config files cannot
/// name it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
    Never,
    #[serde(skip)]
    Other(String),
}

impl ChangeFreq {
    /// Read a `<changefreq>` value from an existing document.
    pub fn from_document(value: &str) -> Self {
        value
            .parse()
            .unwrap_or_else(|_| ChangeFreq::Other(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
            ChangeFreq::Other(value) => value,
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("unknown change frequency '{0}'")]
pub struct UnknownChangeFreq(pub String);

impl FromStr for ChangeFreq {
    type Err = UnknownChangeFreq;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(ChangeFreq::Always),
            "hourly" => Ok(ChangeFreq::Hourly),
            "daily" => Ok(ChangeFreq::Daily),
            "weekly" => Ok(ChangeFreq::Weekly),
            "monthly" => Ok(ChangeFreq::Monthly),
            "yearly" => Ok(ChangeFreq::Yearly),
            "never" => Ok(ChangeFreq::Never),
            _ => Err(UnknownChangeFreq(s.to_string())),
        }
    }
}

/// One `<url>` element of a sitemap document.
///
/// Optional fields come from merged documents that omit a child element, or
/// from a priority list too short for the route's depth. They are written as
/// empty elements.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    /// Absolute URL. Unique within its map.
    pub loc: String,
    pub changefreq: Option<ChangeFreq>,
    /// W3C datetime, e.g. `2024-05-01T10:00:00.000Z`.
    pub lastmod: Option<String>,
    /// Decimal string, e.g. `"0.5"`.
    pub priority: Option<String>,
}

/// Insertion-ordered mapping from location to entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapMap {
    entries: Vec<SitemapEntry>,
    index: HashMap<String, usize>,
}

impl SitemapMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry keyed by its location.
    ///
    /// An existing entry at the same location is replaced in place (it keeps
    /// its position) and returned.
    pub fn insert(&mut self, entry: SitemapEntry) -> Option<SitemapEntry> {
        match self.index.get(&entry.loc) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], entry)),
            None => {
                self.index.insert(entry.loc.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, loc: &str) -> Option<&SitemapEntry> {
        self.index.get(loc).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, loc: &str) -> bool {
        self.index.contains_key(loc)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SitemapEntry> {
        self.entries.iter()
    }

    /// Locations in document order.
    pub fn locations(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.loc.as_str()).collect()
    }
}

impl FromIterator<SitemapEntry> for SitemapMap {
    fn from_iter<I: IntoIterator<Item = SitemapEntry>>(iter: I) -> Self {
        let mut map = SitemapMap::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

/// All maps of one run, keyed by target filename in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SitemapMaps {
    maps: Vec<(String, SitemapMap)>,
}

impl SitemapMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&SitemapMap> {
        self.maps
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, map)| map)
    }

    pub fn get_mut(&mut self, filename: &str) -> Option<&mut SitemapMap> {
        self.maps
            .iter_mut()
            .find(|(name, _)| name == filename)
            .map(|(_, map)| map)
    }

    /// Return the map for `filename`, materializing it with `init` on first use.
    pub fn get_or_try_insert_with<F, E>(
        &mut self,
        filename: &str,
        init: F,
    ) -> Result<&mut SitemapMap, E>
    where
        F: FnOnce() -> Result<SitemapMap, E>,
    {
        let pos = match self.maps.iter().position(|(name, _)| name == filename) {
            Some(pos) => pos,
            None => {
                self.maps.push((filename.to_string(), init()?));
                self.maps.len() - 1
            }
        };
        Ok(&mut self.maps[pos].1)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SitemapMap)> {
        self.maps.iter().map(|(name, map)| (name.as_str(), map))
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.maps.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(loc: &str, priority: &str) -> SitemapEntry {
        SitemapEntry {
            loc: loc.to_string(),
            changefreq: Some(ChangeFreq::Monthly),
            lastmod: None,
            priority: Some(priority.to_string()),
        }
    }

    #[test]
    fn change_freq_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<ChangeFreq>(), Ok(ChangeFreq::Weekly));
        assert_eq!(" never ".parse::<ChangeFreq>(), Ok(ChangeFreq::Never));
        assert!("fortnightly".parse::<ChangeFreq>().is_err());
    }

    #[test]
    fn change_freq_from_document_keeps_unknown_values() {
        assert_eq!(ChangeFreq::from_document("Daily"), ChangeFreq::Daily);
        let other = ChangeFreq::from_document("fortnightly");
        assert_eq!(other, ChangeFreq::Other("fortnightly".into()));
        assert_eq!(other.as_str(), "fortnightly");
    }

    #[test]
    fn change_freq_default_is_monthly() {
        assert_eq!(ChangeFreq::default(), ChangeFreq::Monthly);
        assert_eq!(ChangeFreq::default().to_string(), "monthly");
    }

    #[test]
    fn insert_keeps_order() {
        let map: SitemapMap = [entry("b", "0.5"), entry("a", "0.5"), entry("c", "0.5")]
            .into_iter()
            .collect();
        assert_eq!(map.locations(), vec!["b", "a", "c"]);
    }

    #[test]
    fn insert_existing_location_replaces_in_place() {
        let mut map: SitemapMap = [entry("a", "0.5"), entry("b", "0.5")].into_iter().collect();
        let old = map.insert(entry("a", "1.0"));

        assert_eq!(old.unwrap().priority.as_deref(), Some("0.5"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.locations(), vec!["a", "b"]);
        assert_eq!(map.get("a").unwrap().priority.as_deref(), Some("1.0"));
    }

    #[test]
    fn maps_materialize_once_per_filename() {
        let mut maps = SitemapMaps::new();
        let mut calls = 0;
        for _ in 0..3 {
            let result: Result<_, ()> = maps.get_or_try_insert_with("sitemap.xml", || {
                calls += 1;
                Ok(SitemapMap::new())
            });
            assert!(result.is_ok());
        }
        assert_eq!(calls, 1);
        assert_eq!(maps.filenames(), vec!["sitemap.xml"]);
    }

    #[test]
    fn failed_init_leaves_no_map() {
        let mut maps = SitemapMaps::new();
        let result = maps.get_or_try_insert_with("broken.xml", || Err("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert!(maps.is_empty());
    }
}
