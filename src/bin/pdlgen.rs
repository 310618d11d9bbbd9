//! Parse, merge, normalize and re-emit PDL files.
//!
//! Usage:
//!   pdlgen [OPTIONS] <FILE.pdl>...
//!
//! Files are merged in argument order. The normalized PDL goes to stdout
//! unless `--out` is given; logs go to stderr.
//!
//! Examples:
//!   pdlgen browser_protocol.pdl js_protocol.pdl --prune --out protocol.pdl
//!   pdlgen --check --config tables.json browser_protocol.pdl
//!   RUST_LOG=pdlgen=debug pdlgen browser_protocol.pdl > /dev/null

use anyhow::Context;
use clap::Parser;
use pdlgen::{fix_domains, parse_file, to_pdl, validate_references, FixupConfig, Protocol};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pdlgen")]
#[command(about = "Parse and normalize protocol definition language files")]
struct Args {
    /// PDL files to merge, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON fix-up tables (default: builtin Chrome DevTools tables)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Write the normalized PDL here instead of stdout
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// Skip the fix-up pass; references are still validated
    #[arg(long)]
    no_fixup: bool,

    /// Drop deprecated and redirected declarations before fix-up
    #[arg(long)]
    prune: bool,

    /// Parse, fix up and validate without writing anything
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "pdlgen=info",
        1 => "pdlgen=debug",
        _ => "pdlgen=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => FixupConfig::from_file(path)
            .with_context(|| format!("loading fix-up tables from {}", path.display()))?,
        None => FixupConfig::builtin().context("loading builtin fix-up tables")?,
    };

    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let protocol = parse_file(path).with_context(|| format!("parsing {}", path.display()))?;
        tracing::info!(file = %path.display(), domains = protocol.domains.len(), "parsed");
        sources.push(protocol);
    }
    let mut protocol = Protocol::merge(sources);

    if args.prune {
        protocol.prune();
    }
    if args.no_fixup {
        validate_references(&protocol, &config.circular_deps()).context("validating references")?;
    } else {
        fix_domains(&mut protocol, &config).context("fixing up domains")?;
    }
    tracing::info!(domains = protocol.domains.len(), "protocol ready");

    if args.check {
        return Ok(());
    }
    let text = to_pdl(&protocol).context("writing PDL")?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(file = %path.display(), "wrote");
        }
        None => std::io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if let Err(e) = run(&args) {
        eprintln!("pdlgen: {:#}", e);
        std::process::exit(1);
    }
}
