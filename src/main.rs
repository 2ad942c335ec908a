//! procsig CLI: run the locate → resolve → scan pipeline once

use anyhow::{Context, Result};
use clap::Parser;
use procsig::config::{validate_config, ConfigLoader};
use procsig::memory::{ParallelScanner, Scanner};
use procsig::platform::{self, ProcessSource};
use procsig::process::{ModuleResolver, ProcessLocator};
use procsig::timing::Stopwatch;
use procsig::{Address, MemoryRegion, ProcessId, ScanOutcome, Signature};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "procsig", version, about = "Process introspection and signature scanning")]
struct Args {
    /// Process name to search for (substring match over the status
    /// record; see --exact)
    name: String,

    /// Match the labelled Name field exactly instead of substring
    /// matching the whole status record
    #[arg(long)]
    exact: bool,

    /// Module to resolve inside the process; defaults to the first
    /// executable mapping
    #[arg(short, long)]
    module: Option<String>,

    /// AOB signature to scan for, e.g. "48 8B ?? ?? 89"
    #[arg(short, long)]
    signature: Option<String>,

    /// Report every match instead of the first
    #[arg(long)]
    all: bool,

    /// Scan with the parallel scanner
    #[arg(long)]
    parallel: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "procsig.toml")]
    config: String,

    /// Emit the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    pid: ProcessId,
    module_base: Address,
    module_size: usize,
    module_path: Option<String>,
    matches: Vec<Address>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new(&args.config).load_or_default();
    validate_config(&config).context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(false)
        .init();

    debug!(?config, "configuration loaded");

    let source = platform::native();
    let watch = Stopwatch::start("pipeline");

    let locator = ProcessLocator::new(&source);
    let pid = if args.exact {
        locator.find_by_exact_name(&args.name)?
    } else {
        locator.find_by_name(&args.name)?
    };
    info!(pid, name = %args.name, "located process");

    let resolver = ModuleResolver::new(&source);
    let region = resolver.resolve(pid, args.module.as_deref())?;
    info!(%region, "resolved module");

    let matches = match &args.signature {
        Some(text) => {
            let sig: Signature = text.parse()?;
            let mut hits = scan(&args, &config, &source, pid, &region, &sig)?;
            hits.truncate(config.scanner.max_results);
            hits
        }
        None => Vec::new(),
    };

    info!(elapsed = ?watch.stop(), matches = matches.len(), "pipeline finished");

    let report = Report {
        pid,
        module_base: region.base,
        module_size: region.size,
        module_path: region
            .path
            .as_ref()
            .map(|p| p.display().to_string()),
        matches,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("pid:    {}", report.pid);
        println!("module: {} ({} bytes)", report.module_base, report.module_size);
        if let Some(path) = &report.module_path {
            println!("path:   {path}");
        }
        match (&args.signature, report.matches.as_slice()) {
            (None, _) => {}
            (Some(_), []) => println!("signature not found"),
            (Some(_), hits) => {
                for hit in hits {
                    println!("match:  {hit}");
                }
            }
        }
    }

    Ok(())
}

/// Runs the requested scan flavour over the resolved region
fn scan<S: ProcessSource>(
    args: &Args,
    config: &procsig::config::Config,
    source: &S,
    pid: ProcessId,
    region: &MemoryRegion,
    sig: &Signature,
) -> Result<Vec<Address>> {
    if args.parallel {
        // The parallel scanner works over an in-memory buffer: take
        // a snapshot of the region, then split the candidates across
        // workers. snapshot_region retries short reads, so a source
        // that hands back fewer bytes than asked cannot hide part of
        // the region.
        let buf = Scanner::with_chunk_size(source, config.scanner.chunk_size)
            .snapshot_region(pid, region)?;

        let scanner = ParallelScanner::new(config.scanner.max_threads)
            .with_cancel_stride(config.scanner.cancel_check_interval);
        let hits = if args.all {
            scanner.find_all(&buf, sig)?
        } else {
            scanner.find(&buf, sig)?.found().into_iter().collect()
        };
        Ok(hits
            .into_iter()
            .map(|offset| region.base.offset(offset.as_usize() as isize))
            .collect())
    } else {
        let scanner = Scanner::with_chunk_size(source, config.scanner.chunk_size);
        if args.all {
            Ok(scanner.scan_region_all(pid, region, sig)?)
        } else {
            let outcome = scanner.scan_region(pid, region, sig)?;
            Ok(match outcome {
                ScanOutcome::Found(addr) => vec![addr],
                ScanOutcome::NotFound => Vec::new(),
            })
        }
    }
}
