// src/cli/mod.rs

use crate::models::SignalScope;
use clap::Parser;

pub mod config;

/// parashell: run shell commands in parallel and supervise them as one group.
///
/// By default, the first command that fails brings its siblings down and its exit
/// code becomes parashell's own.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = t!("cli.help.after"),
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// Will not close sibling processes on error.
    #[arg(short, long)]
    pub wait: bool,

    /// Close all sibling processes after the first one exits (success or error).
    #[arg(short, long)]
    pub first: bool,

    /// Log the lifecycle of every command.
    #[arg(short, long)]
    pub verbose: bool,

    /// How far the interrupt reaches when the group is closed.
    #[arg(long, value_enum, default_value_t = SignalScope::Tree)]
    pub signal_scope: SignalScope,

    /// The shell commands to run in parallel.
    pub commands: Vec<String>,
}
