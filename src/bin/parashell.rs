// EN: src/bin/parashell.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use parashell::{
    cli::{Cli, config},
    constants::FAILURE_EXIT_CODE,
    core::{arg_normalizer, supervisor},
};
use std::env;
use std::ffi::OsString;

/// The main entry point of `parashell`.
/// It repairs the raw arguments where needed, parses and validates them, sets up
/// logging, runs the process group, and exits with the coordinated code.
fn main() {
    let code = match run_cli() {
        Ok(code) => code,
        Err(e) => {
            // Configuration and quote-nesting errors end here, before anything is spawned.
            eprintln!("\n{}: {}", "Error".red().bold(), e);
            FAILURE_EXIT_CODE
        }
    };
    std::process::exit(code);
}

fn run_cli() -> Result<i32> {
    let cli = Cli::parse_from(raw_args()?);
    let config = config::resolve(cli)?;
    init_logging(config.verbose);
    log::debug!("Configuration resolved: {:?}", config);

    // One logical thread: the supervisor only waits on events.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(supervisor::run(&config)))
}

/// The process arguments, with nested quoting repaired on Windows.
/// Elsewhere they reach clap untouched, so invalid UTF-8 is rejected there.
fn raw_args() -> Result<Vec<OsString>> {
    let mut args: Vec<OsString> = env::args_os().collect();

    if cfg!(target_os = "windows") && args.len() > 1 {
        let program = args.remove(0);
        let lossy = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        let repaired = arg_normalizer::normalize(lossy)?;
        return Ok(std::iter::once(program)
            .chain(repaired.into_iter().map(OsString::from))
            .collect());
    }
    Ok(args)
}

/// `RUST_LOG` wins; otherwise `--verbose` shows the lifecycle of every command.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "parashell=info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
