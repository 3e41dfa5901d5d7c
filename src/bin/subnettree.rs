mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli_utils::EntriesArgs;
use commands::{cmd_decompose, cmd_inspect, cmd_match, cmd_query};

#[derive(Parser)]
#[command(name = "subnettree")]
#[command(
    about = "Longest-prefix-match lookups of IPv4 addresses against CIDR blocks and ranges",
    long_about = "subnettree - Tag IPv4 addresses with the value of their most specific network\n\n\
    Load networks (CIDR blocks or address ranges) with associated values from\n\
    entries files, then look up addresses against them. Every lookup returns\n\
    the value of the longest matching prefix, or the configured default.\n\n\
    Entries file (text format):\n\
      8.8.8.0/24                  Google\n\
      127.0.0.0-127.255.255.255   localhost\n\
      77.219.59.9                 WAP\n\n\
    Examples:\n\
      subnettree query -e networks.txt -d Unknown 8.8.8.8\n\
      subnettree match -e networks.txt access_ips.txt.gz -j 4\n\
      subnettree decompose 10.0.0.1 10.0.0.10\n\
      subnettree inspect -e networks.csv -f csv --list"
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a single address
    Query {
        #[command(flatten)]
        entries: EntriesArgs,

        /// Address to look up (dotted quad)
        #[arg(value_name = "ADDRESS")]
        address: String,

        /// Quiet mode - no output, only exit code (0 = value found, 1 = none)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Look up every address in files or stdin (one address per line)
    Match {
        #[command(flatten)]
        entries: EntriesArgs,

        /// Address lists (one per line, .gz supported), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Number of lookup worker threads (1 = sequential, preserves input order)
        #[arg(short = 'j', long, default_value = "1")]
        threads: usize,

        /// Output format: json (default, NDJSON) or summary (counts only)
        #[arg(long = "format", default_value = "json", value_name = "FORMAT")]
        output_format: String,

        /// Show load and throughput statistics on stderr
        #[arg(short, long)]
        stats: bool,
    },

    /// Split an address range into the minimal list of CIDR blocks
    Decompose {
        /// First address of the range
        #[arg(value_name = "START")]
        start: String,

        /// Last address of the range (inclusive)
        #[arg(value_name = "END")]
        end: String,

        /// Output blocks as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Load entries and show index statistics
    Inspect {
        #[command(flatten)]
        entries: EntriesArgs,

        /// Output statistics as JSON
        #[arg(short, long)]
        json: bool,

        /// List every stored prefix with its value
        #[arg(short, long)]
        list: bool,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Query {
            entries,
            address,
            quiet,
        } => cmd_query(entries, address, quiet),
        Commands::Match {
            entries,
            inputs,
            threads,
            output_format,
            stats,
        } => cmd_match(entries, inputs, threads, output_format, stats),
        Commands::Decompose { start, end, json } => cmd_decompose(start, end, json),
        Commands::Inspect {
            entries,
            json,
            list,
        } => cmd_inspect(entries, json, list),
    }
}
