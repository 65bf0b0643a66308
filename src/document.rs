//! Sitemap XML documents.
//!
//! Reads existing documents for merging and writes the final ones. Both
//! directions go through `quick-xml`.
//!
//! ## Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>http://localhost/about</loc>
//!     <changefreq>monthly</changefreq>
//!     <lastmod>2024-05-01T10:00:00.000Z</lastmod>
//!     <priority>0.5</priority>
//!   </url>
//! </urlset>
//! ```
//!
//! Child elements are always written in the order above. A missing value is
//! written as an empty element (`<priority/>`).
//!
//! Merging is read-modify-rewrite: the whole document is parsed into a
//! [`SitemapMap`], updated, and written back over the old file.

use crate::types::{ChangeFreq, SitemapEntry, SitemapMap};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Namespace declared on the `<urlset>` root.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("document has no <urlset> root")]
    MissingUrlset,
    #[error("<url> #{0} has no <loc>")]
    MissingLoc(usize),
    #[error("document ends inside <url> #{0}")]
    UnclosedUrl(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Loc,
    ChangeFreq,
    LastMod,
    Priority,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"loc" => Some(Field::Loc),
            b"changefreq" => Some(Field::ChangeFreq),
            b"lastmod" => Some(Field::LastMod),
            b"priority" => Some(Field::Priority),
            _ => None,
        }
    }
}

/// Raw text of one `<url>` element while it is being read.
#[derive(Debug, Default)]
struct PartialEntry {
    loc: Option<String>,
    changefreq: Option<String>,
    lastmod: Option<String>,
    priority: Option<String>,
}

impl PartialEntry {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Loc => &mut self.loc,
            Field::ChangeFreq => &mut self.changefreq,
            Field::LastMod => &mut self.lastmod,
            Field::Priority => &mut self.priority,
        }
    }

    fn push_text(&mut self, field: Field, text: &str) {
        self.slot(field).get_or_insert_with(String::new).push_str(text);
    }

    fn finish(self, index: usize) -> Result<SitemapEntry, DocumentError> {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let loc = non_empty(self.loc).ok_or(DocumentError::MissingLoc(index))?;
        Ok(SitemapEntry {
            loc,
            changefreq: non_empty(self.changefreq).map(|v| ChangeFreq::from_document(&v)),
            lastmod: non_empty(self.lastmod),
            priority: non_empty(self.priority),
        })
    }
}

/// Parse a sitemap document into a map keyed by location.
///
/// Later `<url>` elements with a location seen before replace the earlier
/// entry. Only direct children of `<url>` are read; extension elements such
/// as `<image:image>` are skipped along with everything inside them.
pub fn parse_document(xml: &str) -> Result<SitemapMap, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut map = SitemapMap::new();
    let mut saw_urlset = false;
    let mut current: Option<PartialEntry> = None;
    let mut field: Option<Field> = None;
    // Elements open inside the current <url>.
    let mut depth = 0usize;
    let mut url_index = 0;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if current.is_some() {
                    if depth == 0 {
                        field = Field::from_name(e.local_name().as_ref());
                    }
                    depth += 1;
                    continue;
                }
                match e.local_name().as_ref() {
                    b"urlset" => saw_urlset = true,
                    b"url" => {
                        url_index += 1;
                        current = Some(PartialEntry::default());
                        depth = 0;
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if current.is_some() {
                    continue;
                }
                match e.local_name().as_ref() {
                    b"urlset" => saw_urlset = true,
                    b"url" => {
                        url_index += 1;
                        return Err(DocumentError::MissingLoc(url_index));
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let (Some(entry), Some(f), 1) = (current.as_mut(), field, depth) {
                    entry.push_text(f, &text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let (Some(entry), Some(f), 1) = (current.as_mut(), field, depth) {
                    let raw = data.into_inner();
                    entry.push_text(f, &String::from_utf8_lossy(&raw));
                }
            }
            Event::End(_) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    field = None;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"url" => {
                if let Some(entry) = current.take() {
                    map.insert(entry.finish(url_index)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(DocumentError::UnclosedUrl(url_index));
    }
    if !saw_urlset {
        return Err(DocumentError::MissingUrlset);
    }
    Ok(map)
}

/// Load and parse the document at `path`.
///
/// Returns `Ok(None)` if no file exists there.
pub fn load_document(path: &Path) -> Result<Option<SitemapMap>, DocumentError> {
    if !path.exists() {
        return Ok(None);
    }
    let xml = fs::read_to_string(path)?;
    parse_document(&xml).map(Some)
}

fn write_child<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: Option<&str>,
) -> Result<(), DocumentError> {
    match value {
        Some(value) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(value)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        None => writer.write_event(Event::Empty(BytesStart::new(name)))?,
    }
    Ok(())
}

/// Serialize a map to a pretty-printed sitemap document.
pub fn render_document(map: &SitemapMap) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(urlset))?;

    for entry in map.iter() {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_child(&mut writer, "loc", Some(&entry.loc))?;
        write_child(
            &mut writer,
            "changefreq",
            entry.changefreq.as_ref().map(ChangeFreq::as_str),
        )?;
        write_child(&mut writer, "lastmod", entry.lastmod.as_deref())?;
        write_child(&mut writer, "priority", entry.priority.as_deref())?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut xml = String::from_utf8(writer.into_inner().into_inner())?;
    xml.push('\n');
    Ok(xml)
}

/// Write a map to `path`, replacing any existing file.
///
/// Returns the number of entries written.
pub fn write_document(map: &SitemapMap, path: &Path) -> Result<usize, DocumentError> {
    let xml = render_document(map)?;
    fs::write(path, xml)?;
    Ok(map.len())
}
