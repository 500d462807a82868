// EN: src/system/process_group.rs

use crate::{
    models::{ChildState, GroupEvent, SignalScope, Watch},
    system::{
        child::{self, ChildHandle},
        shell,
    },
};
use std::process::Stdio;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum GroupError {
    #[error("Command '{command}' could not be spawned: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{0}' was spawned but reported no process id.")]
    MissingPid(String),
    #[error("The process group has already been spawned.")]
    AlreadySpawned,
}

/// Result of asking the group to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing was running; the caller can exit right away.
    Complete,
    /// Interrupts were sent; this many children still have to report back.
    Pending { awaiting: usize },
}

/// Every child of one invocation, plus the queue their completions arrive on.
#[derive(Debug)]
pub struct ProcessGroup {
    scope: SignalScope,
    children: Vec<ChildHandle>,
    spawned: bool,
    events_tx: mpsc::UnboundedSender<GroupEvent>,
    events_rx: mpsc::UnboundedReceiver<GroupEvent>,
}

impl ProcessGroup {
    pub fn new(scope: SignalScope) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            scope,
            children: Vec::new(),
            spawned: false,
            events_tx,
            events_rx,
        }
    }

    /// A sender for posting events (child exits, interrupts) to the group's queue.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<GroupEvent> {
        self.events_tx.clone()
    }

    pub fn children(&self) -> &[ChildHandle] {
        &self.children
    }

    pub fn running_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_running()).count()
    }

    /// Spawns one child per command, in order. Must run inside a tokio runtime.
    ///
    /// The set of children is fixed afterwards: a second call is rejected. If a spawn
    /// fails, the children started before it stay in the group so they can be shut
    /// down through [`terminate_all`](Self::terminate_all).
    pub fn spawn_all(&mut self, commands: &[String]) -> Result<&[ChildHandle], GroupError> {
        if self.spawned {
            return Err(GroupError::AlreadySpawned);
        }
        self.spawned = true;

        for command in commands {
            let handle = self.spawn_one(command)?;
            self.children.push(handle);
        }
        Ok(&self.children)
    }

    fn spawn_one(&self, command: &str) -> Result<ChildHandle, GroupError> {
        let index = self.children.len();
        let command_line = shell::prepare_command_line(command);
        log::debug!("Spawning the command `{}`", command_line);

        let mut std_command = shell::shell_command(&command_line);
        std_command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // A fresh process group per child: the terminal's Ctrl+C only reaches us,
        // and killpg can reach everything the shell forks.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if self.scope == SignalScope::Tree {
                std_command.process_group(0);
            }
        }

        let process = tokio::process::Command::from(std_command)
            .spawn()
            .map_err(|source| GroupError::Spawn {
                command: command_line.clone(),
                source,
            })?;
        let pid = process
            .id()
            .ok_or_else(|| GroupError::MissingPid(command_line.clone()))?;

        let (interrupt_tx, interrupt_rx) = oneshot::channel();
        tokio::spawn(child::watch(
            index,
            process,
            pid,
            self.scope,
            interrupt_rx,
            self.events_tx.clone(),
        ));

        log::info!(t!("group.info.started"), command = command_line, pid = pid);
        Ok(ChildHandle::new(command_line, pid, interrupt_tx))
    }

    /// Waits for the next event on the queue.
    pub async fn next_event(&mut self) -> Option<GroupEvent> {
        self.events_rx.recv().await
    }

    /// Records that the child at `index` finished.
    ///
    /// Returns who was watching it, or `None` for an unknown index or a child that
    /// had already settled, so a duplicate event is never counted twice.
    pub fn settle(&mut self, index: usize, state: ChildState) -> Option<Watch> {
        let child = self.children.get_mut(index)?;
        let watch = child.settle(state)?;
        let command = child.command();

        match (watch, child.state()) {
            (Watch::Shutdown, _) => log::info!(t!("group.info.closed"), command = command),
            (Watch::Policy, ChildState::Exited(0)) => {
                log::info!(t!("group.info.succeeded"), command = command)
            }
            (Watch::Policy, ChildState::Exited(code)) => {
                log::info!(t!("group.info.failed"), command = command, code = code)
            }
            (Watch::Policy, ChildState::Signaled(signal)) => {
                log::info!(t!("group.info.signaled"), command = command, signal = signal)
            }
            (Watch::Policy, ChildState::Running) => {}
        }
        Some(watch)
    }

    /// Interrupts every child that is still running.
    ///
    /// Each one leaves the policy's watch before its signal goes out, so its own exit
    /// can never trigger another shutdown.
    pub fn terminate_all(&mut self, code: i32) -> Termination {
        log::debug!("Terminating the group with code {}", code);

        let mut awaiting = 0;
        for child in self.children.iter_mut().filter(|c| c.is_running()) {
            if child.interrupt() {
                log::info!(t!("group.info.closing"), command = child.command());
            }
            awaiting += 1;
        }

        log::debug!("opened: {}, closed: 0", awaiting);
        if awaiting == 0 {
            Termination::Complete
        } else {
            Termination::Pending { awaiting }
        }
    }

    /// Logs one line per child with its current state.
    pub fn log_status(&self) {
        if !log::log_enabled!(log::Level::Info) {
            return;
        }
        log::info!(t!("group.info.status_header"));
        for child in &self.children {
            let command = child.command();
            match child.state() {
                ChildState::Running => {
                    log::info!(t!("group.info.status_running"), command = command)
                }
                ChildState::Exited(0) => {
                    log::info!(t!("group.info.status_finished"), command = command)
                }
                ChildState::Exited(_) => {
                    log::info!(t!("group.info.status_errored"), command = command)
                }
                ChildState::Signaled(signal) => {
                    log::info!(t!("group.info.signaled"), command = command, signal = signal)
                }
            }
        }
    }
}
