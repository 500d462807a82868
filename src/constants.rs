// src/constants.rs

use std::time::Duration;

/// Exit code used when the group is closed without a failing child to blame
/// (for example, a plain Ctrl+C).
pub const NEUTRAL_EXIT_CODE: i32 = 0;

/// Exit code for configuration errors, quote-nesting errors and spawn failures.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// The quote character handled by the argument normalizer.
pub const QUOTE: char = '"';

/// Shell and flag used to run each command on Unix-like systems.
pub const UNIX_SHELL: (&str, &str) = ("sh", "-c");

/// Shell and flag used to run each command on Windows.
pub const WINDOWS_SHELL: (&str, &str) = ("cmd", "/c");

/// How often a shutting-down child is interrupted again until it is reaped. A shell
/// that caught the first SIGINT between fork and exec would otherwise never see one.
pub const INTERRUPT_RESEND_INTERVAL: Duration = Duration::from_millis(200);
