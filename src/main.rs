use chrono::Utc;
use clap::{Parser, Subcommand};
use route_sitemap::{config, generate, output, resolve, routes};
use std::path::{Path, PathBuf};

/// Where the route list comes from.
#[derive(clap::Args, Clone)]
struct RoutesArgs {
    /// Route list: JSON array, or one route per line. Use `-` for stdin.
    #[arg(long)]
    routes: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "route-sitemap")]
#[command(about = "Sitemap and robots.txt generator for statically rendered routes")]
#[command(long_about = "\
Sitemap and robots.txt generator for statically rendered routes

Runs after a static build with the list of routes the build rendered and
writes one or more sitemap documents into the output directory.

Routes can be given as:

  [\"/\", \"/about\"]                          JSON array of strings
  [{\"route\": \"/\"}, {\"route\": \"/about\"}]    JSON array of route objects
  one route per line                       blank lines and # comments skipped

Per-route settings live in [[routes]] tables of sitemap.toml; the first
table whose pattern matches a route applies to it.

Run 'route-sitemap gen-config' to generate a documented sitemap.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Suppress status output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write sitemap documents (and robots.txt) for a route list
    Build(RoutesArgs),
    /// Validate config and show where each route would land, without writing
    Check(RoutesArgs),
    /// Print a stock sitemap.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => {
            let site_config = config::load_config(&cli.config)?;
            let route_list = load_routes(args.routes.as_deref())?;
            std::fs::create_dir_all(&cli.output)?;
            let report =
                generate::run(route_list.as_deref(), &site_config, &cli.output, Utc::now())?;
            output::print_build_report(&report, cli.quiet || site_config.suppress_log);
        }
        Command::Check(args) => {
            let site_config = config::load_config(&cli.config)?;
            let rules = resolve::RouteRules::compile(&site_config)?;
            if let Some(route_list) = load_routes(args.routes.as_deref())? {
                output::print_plan(&generate::plan_routes(&route_list, &site_config, &rules));
            }
            if !cli.quiet {
                println!("==> Config is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read the route list, if one was given.
fn load_routes(path: Option<&Path>) -> Result<Option<Vec<String>>, routes::RoutesError> {
    path.map(routes::read_routes).transpose()
}
