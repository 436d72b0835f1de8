//! CLI entry point for the OAM analysis tools.
//!
//! Loads a graph snapshot exported by the discovery engine and runs one of
//! the analyses against it. Results go to stdout (or `-o`); logs go to stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use oam_analysis::delta::parse_cutoff;
use oam_analysis::format::{output_line, render_summary};
use oam_analysis::{AddressFilter, AnalysisEngine};
use oam_core::config::{load_config, read_domain_list};
use oam_core::scope::normalize_domains;
use oam_graph::{GraphConfig, MemoryGraph};

#[derive(Parser)]
#[command(name = "oam-tools")]
#[command(about = "Analyze the asset graph collected by the OAM discovery engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: oam).
    #[arg(short, long, default_value = "oam", global = true)]
    config: String,

    /// Graph snapshot to load (overrides the configured path).
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Root domain names, comma separated (can be used multiple times).
    #[arg(short = 'd', long = "domain", value_delimiter = ',', global = true)]
    domains: Vec<String>,

    /// File providing root domain names, one per line.
    #[arg(long = "df", global = true)]
    domains_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List discovered names, their addresses, and the ASN summary.
    Subs(SubsArgs),
    /// Print names discovered since a point in time.
    Track {
        /// Exclude names first seen before this time (RFC 3339 or "01/02 15:04:05 2006 MST").
        #[arg(long)]
        since: Option<String>,
    },
    /// Print the node/edge projection of the scope as JSON.
    Viz {
        /// Exclude assets not seen since this time.
        #[arg(long)]
        since: Option<String>,
        /// Write the JSON to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SubsArgs {
    /// Show the IP addresses for discovered names.
    #[arg(long)]
    ip: bool,
    /// Show the IPv4 addresses for discovered names.
    #[arg(long)]
    ipv4: bool,
    /// Show the IPv6 addresses for discovered names.
    #[arg(long)]
    ipv6: bool,
    /// Print the ASN table summary.
    #[arg(long)]
    summary: bool,
    /// Print the discovered names.
    #[arg(long)]
    names: bool,
    /// Print both the names and the summary.
    #[arg(long)]
    show: bool,
    /// Censor output to make it suitable for demonstrations.
    #[arg(long)]
    demo: bool,
    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,
    /// Write results to this file instead of the terminal.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let mut domains = cli.domains.clone();
    if let Some(path) = &cli.domains_file {
        domains.extend(
            read_domain_list(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        );
    }
    domains.extend(config.all_domains().context("Failed to read the configured domains")?);
    let domains = normalize_domains(domains);
    if domains.is_empty() {
        bail!("No root domain names were provided");
    }

    let graph_config = GraphConfig {
        snapshot: cli
            .snapshot
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.snapshot)),
    };
    let graph = MemoryGraph::open(&graph_config)
        .with_context(|| format!("Failed to load {}", graph_config.snapshot.display()))?;

    let engine = AnalysisEngine::new(graph).with_scope(&domains);

    match cli.command {
        Command::Subs(args) => run_subs(&engine, &args)?,
        Command::Track { since } => {
            let engine = engine.with_cutoff(since.as_deref().map(cutoff_arg).transpose()?);
            for name in engine.new_names() {
                println!("{name}");
            }
        }
        Command::Viz { since, output } => {
            let engine = engine.with_cutoff(since.as_deref().map(cutoff_arg).transpose()?);
            let json = serde_json::to_string_pretty(&engine.visualize())?;
            emit(output.as_ref(), &json)?;
        }
    }

    Ok(())
}

fn run_subs(engine: &AnalysisEngine<MemoryGraph>, args: &SubsArgs) -> anyhow::Result<()> {
    let show_names = args.names || args.show;
    let show_summary = args.summary || args.show;
    if !show_names && !show_summary && !args.json {
        bail!("Nothing to print: pass --names, --summary, --show, or --json");
    }

    let mut filter = AddressFilter {
        ipv4: args.ip || args.ipv4,
        ipv6: args.ip || args.ipv6,
    };
    if show_summary && filter.is_empty() {
        filter = AddressFilter::both();
    }

    let listing = engine.discover_names(filter);

    if args.json {
        return emit(args.output.as_ref(), &serde_json::to_string_pretty(&listing)?);
    }

    let mut text = String::new();
    if show_names {
        for record in &listing.names {
            let ips: Vec<_> = record.addresses.iter().map(|a| a.ip).collect();
            text.push_str(&output_line(&record.name, &ips, args.demo));
            text.push('\n');
        }
    }

    if show_summary {
        let summary = render_summary(listing.names.len(), &listing.summary, args.demo);
        // With both sections on a terminal, the summary goes to stderr.
        if args.output.is_none() && show_names {
            eprint!("{summary}");
        } else {
            text.push_str(&summary);
        }
    }

    match &args.output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}

fn cutoff_arg(raw: &str) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    parse_cutoff(raw).with_context(|| {
        format!("{raw} is not in the correct format: RFC 3339 or \"01/02 15:04:05 2006 MST\"")
    })
}

fn emit(output: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?
        }
        None => println!("{content}"),
    }
    Ok(())
}
