//! Route pattern compilation.
//!
//! Override tables and ignore lists name routes with Express-style path
//! patterns. A pattern compiles once into a [`RouteMatcher`] that wraps an
//! anchored, case-insensitive [`Regex`].
//!
//! ## Pattern Syntax
//!
//! ```text
//! /about              literal route (trailing slash optional when matching)
//! /blog/:slug         one non-empty segment
//! /docs/:page?        optional segment (the leading `/` is optional too)
//! /files/:path*       zero or more segments
//! /files/:path+       one or more segments
//! /user/:id(\d+)      parameter with a custom expression
//! /archive/(\d{4})    unnamed custom group
//! /legacy/*           wildcard, matches anything
//! ```
//!
//! Use `\` to escape any of `:()*?+` when they are meant literally.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern '{pattern}': missing parameter name at byte {index}")]
    MissingName { pattern: String, index: usize },
    #[error("pattern '{pattern}': unbalanced group at byte {index}")]
    UnbalancedGroup { pattern: String, index: usize },
    #[error("pattern '{pattern}': empty group at byte {index}")]
    EmptyGroup { pattern: String, index: usize },
    #[error("pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Default expression for a single path segment.
const SEGMENT: &str = "[^/#?]+?";

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    pattern: String,
    regex: Regex,
}

impl RouteMatcher {
    /// Compile a path pattern into a matcher.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let body = pattern_to_regex(pattern)?;
        let source = format!("(?i)^{body}[/#?]?$");
        let regex = Regex::new(&source).map_err(|source| PatternError::Regex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Whether the whole route matches the pattern.
    pub fn is_match(&self, route: &str) -> bool {
        self.regex.is_match(route)
    }

    /// The source pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The generated regular expression, mostly useful for diagnostics.
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

fn read_modifier(chars: &[(usize, char)], pos: &mut usize) -> Modifier {
    let modifier = match chars.get(*pos).map(|(_, c)| *c) {
        Some('?') => Modifier::Optional,
        Some('*') => Modifier::ZeroOrMore,
        Some('+') => Modifier::OneOrMore,
        _ => return Modifier::One,
    };
    *pos += 1;
    modifier
}

/// Read a `( ... )` group starting at `pos` (which must point at `(`).
/// Returns the inner expression and advances past the closing paren.
fn read_group(
    pattern: &str,
    chars: &[(usize, char)],
    pos: &mut usize,
) -> Result<String, PatternError> {
    let start = chars[*pos].0;
    let mut depth = 0usize;
    let mut inner = String::new();
    while let Some(&(_, c)) = chars.get(*pos) {
        *pos += 1;
        match c {
            '\\' => {
                inner.push(c);
                if let Some(&(_, next)) = chars.get(*pos) {
                    inner.push(next);
                    *pos += 1;
                }
            }
            '(' => {
                if depth > 0 {
                    inner.push(c);
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if inner.is_empty() {
                        return Err(PatternError::EmptyGroup {
                            pattern: pattern.to_string(),
                            index: start,
                        });
                    }
                    return Ok(inner);
                }
                inner.push(c);
            }
            _ => inner.push(c),
        }
    }
    Err(PatternError::UnbalancedGroup {
        pattern: pattern.to_string(),
        index: start,
    })
}

/// Render one parameter. A `/` directly in front of a parameter is folded
/// into it so that optional and repeated parameters own their separator.
fn render_param(out: &mut String, prefix: &str, expr: &str, modifier: Modifier) {
    let prefix = regex::escape(prefix);
    match (modifier, prefix.is_empty()) {
        (Modifier::One, _) => out.push_str(&format!("{prefix}({expr})")),
        (Modifier::Optional, true) => out.push_str(&format!("({expr})?")),
        (Modifier::Optional, false) => out.push_str(&format!("(?:{prefix}({expr}))?")),
        (Modifier::OneOrMore, true) => out.push_str(&format!("((?:{expr})+)")),
        (Modifier::ZeroOrMore, true) => out.push_str(&format!("((?:{expr})*)")),
        (Modifier::OneOrMore, false) => {
            out.push_str(&format!("(?:{prefix}((?:{expr})(?:{prefix}(?:{expr}))*))"))
        }
        (Modifier::ZeroOrMore, false) => {
            out.push_str(&format!("(?:{prefix}((?:{expr})(?:{prefix}(?:{expr}))*))?"))
        }
    }
}

fn flush_literal(out: &mut String, literal: &mut String) {
    out.push_str(&regex::escape(literal));
    literal.clear();
}

fn take_prefix(literal: &mut String) -> &'static str {
    if literal.ends_with('/') {
        literal.pop();
        "/"
    } else {
        ""
    }
}

fn pattern_to_regex(pattern: &str) -> Result<String, PatternError> {
    let chars: Vec<(usize, char)> = pattern.char_indices().collect();
    let mut out = String::new();
    let mut literal = String::new();
    let mut pos = 0;

    while let Some(&(index, c)) = chars.get(pos) {
        match c {
            '\\' => {
                pos += 1;
                if let Some(&(_, next)) = chars.get(pos) {
                    literal.push(next);
                    pos += 1;
                }
            }
            ':' => {
                pos += 1;
                let name_start = pos;
                while chars
                    .get(pos)
                    .is_some_and(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
                {
                    pos += 1;
                }
                if pos == name_start {
                    return Err(PatternError::MissingName {
                        pattern: pattern.to_string(),
                        index,
                    });
                }
                let expr = if chars.get(pos).is_some_and(|(_, c)| *c == '(') {
                    read_group(pattern, &chars, &mut pos)?
                } else {
                    SEGMENT.to_string()
                };
                let modifier = read_modifier(&chars, &mut pos);
                let prefix = take_prefix(&mut literal);
                flush_literal(&mut out, &mut literal);
                render_param(&mut out, prefix, &expr, modifier);
            }
            '(' => {
                let expr = read_group(pattern, &chars, &mut pos)?;
                let modifier = read_modifier(&chars, &mut pos);
                let prefix = take_prefix(&mut literal);
                flush_literal(&mut out, &mut literal);
                render_param(&mut out, prefix, &expr, modifier);
            }
            '*' => {
                pos += 1;
                flush_literal(&mut out, &mut literal);
                out.push_str("(.*)");
            }
            _ => {
                literal.push(c);
                pos += 1;
            }
        }
    }
    flush_literal(&mut out, &mut literal);
    Ok(out)
}
