// EN: src/core/supervisor.rs

use crate::{
    constants::FAILURE_EXIT_CODE,
    core::coordinator::ExitCoordinator,
    models::{ChildState, Config, GroupEvent, Watch},
    system::{
        process_group::{ProcessGroup, Termination},
        signal_router,
    },
};

/// Runs one invocation end to end and returns the code the process should exit with.
///
/// 1. The interrupt router is registered, so Ctrl+C is routed from here on.
/// 2. Every command is spawned. A spawn failure is reported and shuts the already
///    running children down with a failure code.
/// 3. Events are consumed until every child has reached a terminal state.
pub async fn run(config: &Config) -> i32 {
    let mut group = ProcessGroup::new(config.signal_scope);
    let mut coordinator = ExitCoordinator::new(config.policy);
    log::debug!(
        "Supervising {} command(s) with the '{}' policy",
        config.commands.len(),
        coordinator.policy()
    );

    let router = match signal_router::spawn(group.event_sender()) {
        Ok(router) => Some(router),
        Err(e) => {
            log::warn!(t!("supervisor.warn.no_router"), error = e);
            None
        }
    };

    if let Err(e) = group.spawn_all(&config.commands) {
        log::error!("{}", e);
        if let Some(code) = coordinator.trigger(FAILURE_EXIT_CODE) {
            shut_down(&mut group, code);
        }
    }

    let code = supervise(&mut group, &mut coordinator).await;

    if let Some(router) = router {
        router.abort();
    }
    code
}

/// The event loop: one event at a time, until no child is left running.
///
/// Returns immediately when nothing is running, so a group whose children have all
/// finished never waits for an event that cannot arrive.
pub async fn supervise(group: &mut ProcessGroup, coordinator: &mut ExitCoordinator) -> i32 {
    while group.running_count() > 0 {
        let Some(event) = group.next_event().await else {
            log::warn!("Event queue closed with children still running");
            break;
        };
        log::trace!("Event: {:?}", event);

        match event {
            GroupEvent::Exited { index, state } => {
                on_child_exit(group, coordinator, index, state);
            }
            GroupEvent::Interrupted => {
                if let Some(code) = coordinator.on_interrupt() {
                    shut_down(group, code);
                } else {
                    log::debug!("Interrupt received while already shutting down");
                }
            }
        }
    }

    let code = coordinator.exit_code();
    log::info!(t!("supervisor.info.exit_code"), code = code);
    code
}

fn on_child_exit(
    group: &mut ProcessGroup,
    coordinator: &mut ExitCoordinator,
    index: usize,
    state: ChildState,
) {
    match group.settle(index, state.clone()) {
        Some(Watch::Policy) => {
            if let Some(code) = coordinator.on_child_exit(&state) {
                shut_down(group, code);
            }
        }
        Some(Watch::Shutdown) => {
            log::debug!(
                "opened: {}, still running: {}",
                group.children().len(),
                group.running_count()
            );
        }
        None => log::debug!("Ignoring repeated exit event for child #{}", index),
    }
    group.log_status();
}

fn shut_down(group: &mut ProcessGroup, code: i32) {
    match group.terminate_all(code) {
        Termination::Complete => log::debug!("Nothing left to close"),
        Termination::Pending { awaiting } => {
            log::debug!("Waiting for {} child(ren) to close", awaiting);
        }
    }
}
