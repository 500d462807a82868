// src/models.rs

use clap::ValueEnum;
use std::fmt;

// --- GROUP CONFIGURATION ---

/// Decides when the exit of one child brings the whole group down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationPolicy {
    /// Any non-zero exit shuts the group down with that code.
    #[default]
    Default,
    /// Failures never shut the group down; every child runs to completion.
    WaitOnError,
    /// The first child to finish, successfully or not, shuts the group down.
    FirstExit,
}

impl fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::WaitOnError => "wait",
            Self::FirstExit => "first",
        };
        f.write_str(name)
    }
}

/// How far an interrupt reaches when the group is shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SignalScope {
    /// The child and every process it forked (its whole process group).
    /// Windows has no process groups and degrades to `Child`.
    #[default]
    Tree,
    /// Only the immediate shell process.
    Child,
}

// --- CHILD LIFECYCLE ---

/// Lifecycle of one spawned command. `Running` transitions exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildState {
    Running,
    Exited(i32),
    Signaled(String),
}

impl ChildState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The exit code, if the process exited on its own terms.
    /// A signal-terminated process reports none.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Running | Self::Signaled(_) => None,
        }
    }
}

impl fmt::Display for ChildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Exited(code) => write!(f, "exited with code {}", code),
            Self::Signaled(signal) => write!(f, "terminated by {}", signal),
        }
    }
}

/// Who is listening for a child's completion.
///
/// A child starts out feeding the termination policy. Once the group begins shutting
/// down, every running child moves to `Shutdown`: its completion only counts towards
/// the clean exit and can never trigger the policy again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watch {
    Policy,
    Shutdown,
}

/// A message on the supervisor's single event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    /// The child at `index` reached a terminal state.
    Exited { index: usize, state: ChildState },
    /// The supervisor itself received an interrupt (Ctrl+C).
    Interrupted,
}

// --- INVOCATION ---

/// Everything one invocation needs, validated before any process is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub policy: TerminationPolicy,
    pub signal_scope: SignalScope,
    pub verbose: bool,
    pub commands: Vec<String>,
}
