//! flowscan CLI - static workflow discovery
//!
//! Subcommands:
//!
//! 1. scan: find decorated flows under a directory, print them as JSON
//! 2. deployments: normalize exported deployment records
//! 3. catalog: flows joined with their deployments (branch → env)
//! 4. invoke: run a named SDK object and write its JSON to a file
//! 5. version: write the version report to a file
//!
//! Stdout carries JSON only. Diagnostics go to stderr through tracing.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use flowscan::catalog::build_catalog;
use flowscan::deployments::{discover_deployments, JsonDeployments};
use flowscan::sdk::{builtin_registry, write_version_file};
use flowscan::{Config, FlowScanner};

/// Find Prefect-style flows in Python sources without running them
///
/// Examples:
///   flowscan scan ./flows --pretty
///   flowscan scan . --marker pipeline
///   flowscan catalog ./flows --deployments deployments.json
#[derive(Parser, Debug)]
#[command(name = "flowscan")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    ///
    /// Logs go to stderr. RUST_LOG takes precedence when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a directory tree and print the flow mapping
    Scan {
        /// Directory to scan
        root: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Normalize deployment records (JSON array, `-` for stdin)
    Deployments {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long)]
        pretty: bool,
    },

    /// Cross-reference scanned flows with deployments
    Catalog {
        root: PathBuf,

        /// Deployment records (JSON array, `-` for stdin)
        #[arg(long, value_name = "FILE")]
        deployments: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        #[arg(long)]
        pretty: bool,
    },

    /// Run a named SDK object and write its JSON output
    Invoke {
        /// Object name, e.g. flow_details or version
        name: String,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Root scanned by flow_details
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Write the version report to a file
    Version {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

/// Overrides applied on top of the file configuration.
#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Decorator name to detect (overrides config, default "flow")
    #[arg(long)]
    pub marker: Option<String>,

    /// Parse files sequentially
    #[arg(long)]
    pub no_parallel: bool,
}

impl ScanArgs {
    fn scanner(&self, root: &Path) -> FlowScanner {
        let mut config = Config::load(root);
        if let Some(ref marker) = self.marker {
            config.marker = marker.clone();
        }
        if self.no_parallel {
            config.parallel = false;
        }
        let scanner = FlowScanner::new(config);
        tracing::info!("{}", scanner.config().display_summary());
        scanner
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Scan { root, scan, pretty } => {
            let outcome = scan.scanner(&root).scan_directory(&root)?;
            print_json(&outcome.flows, pretty)?;
        }
        Command::Deployments { file, pretty } => {
            let deployments = discover_deployments(&JsonDeployments::new(file))?;
            print_json(&deployments, pretty)?;
        }
        Command::Catalog {
            root,
            deployments,
            scan,
            pretty,
        } => {
            let outcome = scan.scanner(&root).scan_directory(&root)?;
            let deployments = discover_deployments(&JsonDeployments::new(deployments))?;
            print_json(&build_catalog(&outcome.flows, &deployments), pretty)?;
        }
        Command::Invoke { name, output, root } => {
            builtin_registry(root)?.invoke_to_file(&name, &output)?;
        }
        Command::Version { output } => {
            write_version_file(&output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
