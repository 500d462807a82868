// EN: src/system/signal_router.rs

use crate::models::GroupEvent;
use std::io;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[cfg(unix)]
type InterruptListener = tokio::signal::unix::Signal;

#[cfg(windows)]
type InterruptListener = tokio::signal::windows::CtrlC;

#[cfg(unix)]
fn listen() -> io::Result<InterruptListener> {
    use tokio::signal::unix::{SignalKind, signal};
    signal(SignalKind::interrupt())
}

#[cfg(windows)]
fn listen() -> io::Result<InterruptListener> {
    tokio::signal::windows::ctrl_c()
}

/// Forwards every interrupt the supervisor receives as a `GroupEvent::Interrupted`.
///
/// The listener is registered before this returns, so a Ctrl+C arriving at any later
/// point is routed instead of killing the supervisor. The task ends when the queue
/// is closed. Must run inside a tokio runtime.
pub fn spawn(events: mpsc::UnboundedSender<GroupEvent>) -> io::Result<JoinHandle<()>> {
    let mut listener = listen()?;
    Ok(tokio::spawn(async move {
        while listener.recv().await.is_some() {
            log::info!(t!("router.info.interrupted"));
            if events.send(GroupEvent::Interrupted).is_err() {
                break;
            }
        }
    }))
}
