// EN: src/core/coordinator.rs

use crate::{
    constants::NEUTRAL_EXIT_CODE,
    models::{ChildState, TerminationPolicy},
};

/// The policy state machine that decides when the group shuts down and with which
/// exit code.
///
/// Only the first trigger is honored. Once a shutdown is underway every later
/// completion or interrupt is observed and ignored.
#[derive(Debug)]
pub struct ExitCoordinator {
    policy: TerminationPolicy,
    trigger: Option<i32>,
}

impl ExitCoordinator {
    pub fn new(policy: TerminationPolicy) -> Self {
        Self {
            policy,
            trigger: None,
        }
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    pub fn is_shutting_down(&self) -> bool {
        self.trigger.is_some()
    }

    /// Feeds a child's terminal state into the policy.
    /// Returns the code to shut the group down with, if this completion triggers it.
    pub fn on_child_exit(&mut self, state: &ChildState) -> Option<i32> {
        let code = state.exit_code().unwrap_or(NEUTRAL_EXIT_CODE);
        let triggers = match self.policy {
            TerminationPolicy::Default => code != 0,
            TerminationPolicy::WaitOnError => false,
            TerminationPolicy::FirstExit => true,
        };
        if triggers { self.trigger(code) } else { None }
    }

    /// An external interrupt always shuts the group down, with the neutral code.
    pub fn on_interrupt(&mut self) -> Option<i32> {
        self.trigger(NEUTRAL_EXIT_CODE)
    }

    /// Requests a shutdown with `code`. Returns `None` if one was already triggered.
    pub fn trigger(&mut self, code: i32) -> Option<i32> {
        if self.trigger.is_some() {
            log::debug!(
                "Shutdown already triggered; ignoring request with code {}",
                code
            );
            return None;
        }
        log::debug!("Shutdown triggered with code {}", code);
        self.trigger = Some(code);
        Some(code)
    }

    /// The code the supervisor exits with once every child has finished.
    pub fn exit_code(&self) -> i32 {
        self.trigger.unwrap_or(NEUTRAL_EXIT_CODE)
    }
}
