// EN: src/system/child.rs

use crate::{
    constants::{FAILURE_EXIT_CODE, INTERRUPT_RESEND_INTERVAL},
    models::{ChildState, GroupEvent, SignalScope, Watch},
};
use std::io;
use std::process::ExitStatus;
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};

/// One spawned command, as seen by the process group.
///
/// The OS process itself is owned by a watcher task (see [`watch`]); the handle keeps
/// the bookkeeping and a channel to ask the watcher for an interrupt.
#[derive(Debug)]
pub struct ChildHandle {
    command: String,
    pid: u32,
    state: ChildState,
    watch: Watch,
    interrupt: Option<oneshot::Sender<()>>,
}

impl ChildHandle {
    pub(crate) fn new(command: String, pid: u32, interrupt: oneshot::Sender<()>) -> Self {
        Self {
            command,
            pid,
            state: ChildState::Running,
            watch: Watch::Policy,
            interrupt: Some(interrupt),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> &ChildState {
        &self.state
    }

    pub fn watch(&self) -> Watch {
        self.watch
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Records the terminal state and returns who was watching for it.
    /// A handle settles once; any later call returns `None` and changes nothing.
    pub fn settle(&mut self, state: ChildState) -> Option<Watch> {
        if !self.is_running() || state.is_running() {
            return None;
        }
        self.state = state;
        self.interrupt = None;
        Some(self.watch)
    }

    /// Takes the handle out of the policy's hands and asks its watcher to interrupt
    /// the process. Returns `false` if it was already finished or being shut down.
    pub fn interrupt(&mut self) -> bool {
        if !self.is_running() || self.watch == Watch::Shutdown {
            return false;
        }
        self.watch = Watch::Shutdown;
        if let Some(tx) = self.interrupt.take()
            && tx.send(()).is_err()
        {
            // The watcher already returned; its exit event is queued.
            log::debug!("Watcher for pid {} is already gone", self.pid);
        }
        true
    }
}

// --- Watcher Task ---

/// Waits for the process to finish and posts exactly one `Exited` event.
///
/// If an interrupt is requested first, the signal is delivered and then repeated every
/// [`INTERRUPT_RESEND_INTERVAL`] until the process actually goes away. There is no
/// timeout and no escalation.
pub(crate) async fn watch(
    index: usize,
    mut child: Child,
    pid: u32,
    scope: SignalScope,
    interrupt: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<GroupEvent>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        Ok(()) = interrupt => interrupt_until_exit(&mut child, pid, scope).await,
    };

    let state = match status {
        Ok(status) => state_from_status(status),
        Err(e) => {
            log::error!("Failed to wait for process {}: {}", pid, e);
            ChildState::Exited(FAILURE_EXIT_CODE)
        }
    };

    log::trace!("Child #{} (pid {}) settled: {}", index, pid, state);
    if events.send(GroupEvent::Exited { index, state }).is_err() {
        log::debug!("Supervisor stopped listening before pid {} exited", pid);
    }
}

async fn interrupt_until_exit(
    child: &mut Child,
    pid: u32,
    scope: SignalScope,
) -> io::Result<ExitStatus> {
    // The first tick fires immediately.
    let mut resend = tokio::time::interval(INTERRUPT_RESEND_INTERVAL);
    let mut sent = 0u32;
    loop {
        tokio::select! {
            status = child.wait() => {
                log::trace!("Pid {} closed after {} interrupt(s)", pid, sent);
                return status;
            }
            _ = resend.tick() => {
                deliver_interrupt(child, pid, scope);
                sent += 1;
            }
        }
    }
}

fn state_from_status(status: ExitStatus) -> ChildState {
    if let Some(code) = status.code() {
        return ChildState::Exited(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signo) = status.signal() {
            return ChildState::Signaled(signal_name(signo));
        }
    }

    ChildState::Exited(FAILURE_EXIT_CODE)
}

#[cfg(unix)]
fn signal_name(signo: i32) -> String {
    nix::sys::signal::Signal::try_from(signo)
        .map(|signal| signal.as_str().to_string())
        .unwrap_or_else(|_| format!("signal {}", signo))
}

// --- Signal Delivery ---

#[cfg(unix)]
fn deliver_interrupt(child: &mut Child, pid: u32, scope: SignalScope) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        log::warn!("Pid {} does not fit a signal target; killing it", pid);
        force_kill(child, pid);
        return;
    };
    let target = Pid::from_raw(raw);

    let result = match scope {
        SignalScope::Tree => killpg(target, Signal::SIGINT),
        SignalScope::Child => kill(target, Signal::SIGINT),
    };

    match result {
        Ok(()) => log::debug!("Sent SIGINT to {} (scope: {:?})", pid, scope),
        Err(Errno::ESRCH) => log::debug!("Process {} already exited", pid),
        Err(e) => {
            log::warn!("Could not send SIGINT to {}: {}", pid, e);
            force_kill(child, pid);
        }
    }
}

/// Windows has no process groups and no way to interrupt a single console process,
/// so the immediate child is terminated instead.
#[cfg(not(unix))]
fn deliver_interrupt(child: &mut Child, pid: u32, _scope: SignalScope) {
    force_kill(child, pid);
}

fn force_kill(child: &mut Child, pid: u32) {
    if let Err(e) = child.start_kill() {
        log::warn!("Failed to kill child process {}: {}", pid, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ChildHandle, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (ChildHandle::new("sleep 5".to_string(), 42, tx), rx)
    }

    #[test]
    fn test_new_handle_is_running_under_policy() {
        let (child, _rx) = handle();
        assert!(child.is_running());
        assert_eq!(child.watch(), Watch::Policy);
        assert_eq!(child.command(), "sleep 5");
        assert_eq!(child.pid(), 42);
    }

    #[test]
    fn test_settle_happens_once() {
        let (mut child, _rx) = handle();
        assert_eq!(child.settle(ChildState::Exited(3)), Some(Watch::Policy));
        assert_eq!(child.settle(ChildState::Exited(0)), None);
        assert_eq!(child.state(), &ChildState::Exited(3));
    }

    #[test]
    fn test_settle_rejects_running_state() {
        let (mut child, _rx) = handle();
        assert_eq!(child.settle(ChildState::Running), None);
        assert!(child.is_running());
    }

    #[test]
    fn test_interrupt_moves_to_shutdown_and_notifies_watcher() {
        let (mut child, mut rx) = handle();
        assert!(child.interrupt());
        assert_eq!(child.watch(), Watch::Shutdown);
        assert_eq!(rx.try_recv(), Ok(()));

        // A second request is a no-op.
        assert!(!child.interrupt());
        assert_eq!(
            child.settle(ChildState::Signaled("SIGINT".to_string())),
            Some(Watch::Shutdown)
        );
    }

    #[test]
    fn test_interrupt_after_settle_is_ignored() {
        let (mut child, mut rx) = handle();
        child.settle(ChildState::Exited(0));
        assert!(!child.interrupt());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_interrupt_tolerates_a_finished_watcher() {
        let (mut child, rx) = handle();
        drop(rx);
        assert!(child.interrupt());
        assert_eq!(child.watch(), Watch::Shutdown);
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(2), "SIGINT");
        assert_eq!(signal_name(15), "SIGTERM");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_watcher_keeps_interrupting_until_the_process_exits() {
        use std::os::unix::process::CommandExt;
        use std::time::Duration;

        // Swallows the first SIGINT, then falls back to the default action.
        let mut command = std::process::Command::new("sh");
        command
            .arg("-c")
            .arg("trap 'trap - INT' INT; while :; do sleep 0.1; done")
            .process_group(0);
        let child = tokio::process::Command::from(command).spawn().unwrap();
        let pid = child.id().unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let (interrupt_tx, interrupt_rx) = oneshot::channel();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let watcher = tokio::spawn(watch(
            0,
            child,
            pid,
            SignalScope::Tree,
            interrupt_rx,
            events_tx,
        ));
        interrupt_tx.send(()).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
            .await
            .expect("the trapped shell was interrupted only once")
            .unwrap();
        assert!(matches!(event, GroupEvent::Exited { index: 0, .. }));
        watcher.await.unwrap();
    }
}
