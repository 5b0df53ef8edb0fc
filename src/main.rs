//! gf - Concurrent Breadth-First Filename Search
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use gf::config::{CliArgs, SearchConfig};
use gf::diagnostics::{Diagnostics, PREFIX};
use gf::error::{ConfigError, FinderError, EXIT_FAILURE};
use gf::search::Search;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    // A zero budget never looks at the pattern or the filesystem
    if args.max_results == Some(0) {
        return ExitCode::SUCCESS;
    }

    let quiet = args.quiet;
    setup_logging(args.verbose, quiet);
    install_panic_hook();

    match panic::catch_unwind(AssertUnwindSafe(|| run(args))) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            if !quiet {
                eprintln!("{PREFIX}{e:#}");
            }
            ExitCode::from(exit_code(&e))
        }
        Err(_) => ExitCode::from(EXIT_FAILURE),
    }
}

fn run(args: CliArgs) -> Result<()> {
    let quiet = args.quiet;
    let config = SearchConfig::from_args(args).context("Invalid configuration")?;
    debug!(
        roots = config.roots.len(),
        workers = config.worker_count,
        max_results = ?config.max_results,
        "Configuration loaded"
    );

    let search = Search::new(config, Diagnostics::stderr(quiet));

    // Stop at the next level boundary on Ctrl-C
    let shutdown_flag = search.shutdown_flag();
    ctrlc::set_handler(move || {
        if !quiet {
            eprintln!("\nInterrupt received, shutting down...");
        }
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let outcome = search
        .run(Box::new(io::stdout()))
        .context("Search failed")?;

    if let Some(walk) = &outcome.walk {
        if !walk.completed && !outcome.results.budget_exhausted {
            info!("Search was interrupted before completion");
        }
        if walk.failed > 0 {
            info!(failed = walk.failed, "Search completed with errors");
        }
    }

    Ok(())
}

/// Exit code of the first typed error in the chain
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<FinderError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<ConfigError>() {
            return e.exit_code();
        }
    }
    EXIT_FAILURE
}

/// Route panics through tracing instead of the default stderr dump
fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        error!(thread = name, "{}", info);
    }));
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("gf=debug,warn")
            } else {
                EnvFilter::new("warn")
            }
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .init();
}
