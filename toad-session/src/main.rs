//! toad-session - Command-line front end for acquisition session discovery
//!
//! Classifies subject directories, probes for uncombined sessions, compares
//! two sessions and filters one session against a reference.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use toad_common::config::ConfigResolver;
use toad_session::{RawFileScanner, Session, SessionSummary};
use tracing::info;

/// Command-line arguments for toad-session
#[derive(Parser, Debug)]
#[command(name = "toad-session")]
#[command(about = "Classify subject acquisition directories into sessions and sequences")]
#[command(version)]
struct Args {
    /// Configuration file (overrides the platform default location)
    #[arg(short, long, env = "TOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a subject directory and list its sequences
    Scan {
        directory: PathBuf,
        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },
    /// Report whether a directory holds an uncombined session
    Probe { directory: PathBuf },
    /// Classify two subject directories and compare their fingerprints
    Compare { first: PathBuf, second: PathBuf },
    /// Keep the sequences a reference session also has, taking its prefixes
    Filter {
        directory: PathBuf,
        #[arg(short, long)]
        reference: PathBuf,
        /// Prefix assigned on the reference, as SEQUENCE=PREFIX (repeatable)
        #[arg(short, long = "prefix", value_parser = parse_prefix)]
        prefixes: Vec<(String, String)>,
        #[arg(long)]
        json: bool,
    },
}

fn parse_prefix(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, prefix)) if !name.is_empty() && !prefix.is_empty() => {
            Ok((name.to_string(), prefix.to_string()))
        }
        _ => Err(format!("expected SEQUENCE=PREFIX, got {:?}", value)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new(args.config.clone())
        .load()
        .context("Failed to load configuration")?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    toad_common::logging::init_tracing(level)?;

    info!(
        "Starting toad-session v{} (raw extension .{}, echo marker {:?})",
        env!("CARGO_PKG_VERSION"),
        config.scan.raw_extension,
        config.scan.echo_marker
    );

    let scanner = RawFileScanner::new(&config.scan);

    match args.command {
        Command::Scan { directory, json } => {
            let session = classify(&scanner, &directory)?;
            print_session(&session, json)?;
        }
        Command::Probe { directory } => {
            let session = Session::new(&directory);
            let unf = session
                .is_unf_session(&scanner)
                .with_context(|| format!("Failed to probe {}", directory.display()))?;
            let verdict = if unf { "uncombined" } else { "not uncombined" };
            println!("{}: {}", directory.display(), verdict);
        }
        Command::Compare { first, second } => {
            let a = classify(&scanner, &first)?;
            let b = classify(&scanner, &second)?;
            let comparable = a.is_comparable(&b)?;
            println!(
                "{} and {} are {}",
                a.name(),
                b.name(),
                if comparable { "comparable" } else { "not comparable" }
            );
        }
        Command::Filter {
            directory,
            reference,
            prefixes,
            json,
        } => {
            let session = classify(&scanner, &directory)?;
            let reference = classify(&scanner, &reference)?;
            for (name, prefix) in prefixes {
                if !reference.assign_prefix(&name, prefix) {
                    return Err(anyhow!(
                        "Reference session {} has no sequence named {}",
                        reference.name(),
                        name
                    ));
                }
            }
            let filtered = session.filter_sequences_and_prefix_by_session(&reference);
            print_session(&filtered, json)?;
        }
    }

    Ok(())
}

fn classify(scanner: &RawFileScanner, directory: &Path) -> Result<Session> {
    let mut session = Session::new(directory);
    session
        .initialize_sequences(scanner)
        .with_context(|| format!("Failed to classify {}", directory.display()))?;
    Ok(session)
}

fn print_session(session: &Session, json: bool) -> Result<()> {
    if json {
        let summary = SessionSummary::from(session);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", session);
        if let Some(comparable) = session.comparable() {
            println!("fingerprint: {}", comparable);
        }
    }
    Ok(())
}
