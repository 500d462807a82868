// EN: src/cli/config.rs

use super::Cli;
use crate::models::{Config, TerminationPolicy};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--wait and --first cannot be used together")]
    ConflictingPolicies,
    #[error("No commands given. Pass at least one shell command to run.")]
    NoCommands,
}

/// Maps the `--wait` / `--first` flags to a policy. Both at once is an error.
pub fn policy_from_flags(wait: bool, first: bool) -> Result<TerminationPolicy, ConfigError> {
    match (wait, first) {
        (true, true) => Err(ConfigError::ConflictingPolicies),
        (true, false) => Ok(TerminationPolicy::WaitOnError),
        (false, true) => Ok(TerminationPolicy::FirstExit),
        (false, false) => Ok(TerminationPolicy::Default),
    }
}

/// Validates the parsed command line into the invocation's `Config`.
pub fn resolve(cli: Cli) -> Result<Config, ConfigError> {
    let policy = policy_from_flags(cli.wait, cli.first)?;
    if cli.commands.is_empty() {
        return Err(ConfigError::NoCommands);
    }
    Ok(Config {
        policy,
        signal_scope: cli.signal_scope,
        verbose: cli.verbose,
        commands: cli.commands,
    })
}
