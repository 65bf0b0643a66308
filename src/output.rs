//! CLI output formatting.
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Started route-sitemap
//! Generating sitemaps for 4 routes.
//!     Ignored 1 route
//! Wrote 2 routes to sitemap.xml
//! Wrote 1 route to sitemap-blog.xml
//! Generating robots.txt file
//! Wrote robots.txt file
//! Finished route-sitemap
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 / → sitemap.xml
//!     http://localhost/ (priority 0.5)
//! 002 /404 (ignored)
//! ```

use crate::generate::{BuildReport, RoutePlan};

const NAME: &str = env!("CARGO_PKG_NAME");

/// Pick the singular or plural noun for `n`.
fn pluralize(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

fn routes(n: usize) -> String {
    pluralize(n, "route", "routes")
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format the status lines of one run.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![format!("Started {NAME}")];

    let Some(route_count) = report.route_count else {
        lines.push("No routes were returned".to_string());
        return lines;
    };

    lines.push(format!("Generating sitemaps for {}.", routes(route_count)));
    if report.ignored > 0 {
        lines.push(format!("    Ignored {}", routes(report.ignored)));
    }
    for sitemap in &report.sitemaps {
        lines.push(format!(
            "Wrote {} to {}",
            routes(sitemap.entries),
            sitemap.filename
        ));
    }
    if report.robots.is_some() {
        lines.push("Generating robots.txt file".to_string());
        lines.push("Wrote robots.txt file".to_string());
    }

    lines.push(format!("Finished {NAME}"));
    lines
}

/// Print the status lines of one run unless `quiet`.
pub fn print_build_report(report: &BuildReport, quiet: bool) {
    if quiet {
        return;
    }
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

/// Format the per-route plan shown by `check`.
pub fn format_plan(plans: &[RoutePlan<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, plan) in plans.iter().enumerate() {
        match plan {
            RoutePlan::Ignored { route } => {
                lines.push(format!("{} {} (ignored)", format_index(i + 1), route));
            }
            RoutePlan::Included {
                route,
                resolved,
                loc,
                priority,
            } => {
                lines.push(format!(
                    "{} {} \u{2192} {}",
                    format_index(i + 1),
                    route,
                    resolved.sitemap_filename
                ));
                let priority = priority.as_deref().unwrap_or("none");
                lines.push(format!("    {} (priority {})", loc, priority));
            }
        }
    }
    lines
}

/// Print the per-route plan to stdout.
pub fn print_plan(plans: &[RoutePlan<'_>]) {
    for line in format_plan(plans) {
        println!("{}", line);
    }
}
