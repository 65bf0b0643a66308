//! Route list input.
//!
//! The host build hands over the routes it rendered, in one of three shapes:
//!
//! ```text
//! ["/", "/about"]                                   JSON array of strings
//! [{"route": "/", "type": "default"}, ...]          JSON array of route objects
//! /                                                 one route per line
//! /about                                            (`#` starts a comment)
//! ```
//!
//! Order is preserved; it decides the order of entries in the documents.

use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A route as handed over by the host; extra object fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HandledRoute {
    Plain(String),
    Object { route: String },
}

impl HandledRoute {
    fn into_route(self) -> String {
        match self {
            HandledRoute::Plain(route) | HandledRoute::Object { route } => route,
        }
    }
}

/// Parse a route list in any of the supported shapes.
pub fn parse_routes(content: &str) -> Result<Vec<String>, RoutesError> {
    if content.trim_start().starts_with('[') {
        let items: Vec<HandledRoute> = serde_json::from_str(content)?;
        return Ok(items.into_iter().map(HandledRoute::into_route).collect());
    }
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Read a route list from `path`, or from stdin when `path` is `-`.
pub fn read_routes(path: &Path) -> Result<Vec<String>, RoutesError> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    parse_routes(&content)
}
