//! # System Interaction Layer
//!
//! Everything that talks to the operating system's process and signal APIs. It is
//! the boundary between the policy logic in `core` and the platform specifics.
//!
//! ## Modules
//!
//! - **`child`**: The per-command handle and the watcher task that owns the OS process,
//!   waits for it and delivers interrupts (process group on Unix, the child alone on
//!   Windows).
//! - **`process_group`**: Spawns every command, owns the handles and the event queue, and
//!   closes the whole group on request.
//! - **`shell`**: Picks the platform shell (`sh -c` or `cmd /c`) and adapts command lines
//!   to it.
//! - **`signal_router`**: Turns the supervisor's own Ctrl+C into events on the group's
//!   queue.

pub mod child;
pub mod process_group;
pub mod shell;
pub mod signal_router;
