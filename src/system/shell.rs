// EN: src/system/shell.rs

use crate::constants::{UNIX_SHELL, WINDOWS_SHELL};
use std::process::Command;

/// The shell binary and the flag that makes it run a single command line.
pub fn default_shell() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        WINDOWS_SHELL
    } else {
        UNIX_SHELL
    }
}

/// Adapts a command line to the platform shell.
///
/// `cmd.exe` has no single-quote quoting, so single quotes become double quotes there.
pub fn prepare_command_line(command: &str) -> String {
    if cfg!(target_os = "windows") {
        command.replace('\'', "\"")
    } else {
        command.to_string()
    }
}

/// Builds the process that runs `command_line` through the platform shell.
///
/// On Windows the line is handed to `cmd /c` verbatim; the usual argument escaping
/// would add another layer of quotes that `cmd.exe` does not understand.
pub fn shell_command(command_line: &str) -> Command {
    let (shell, flag) = default_shell();
    let mut command = Command::new(shell);
    command.arg(flag);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.raw_arg(command_line);
    }
    #[cfg(not(windows))]
    {
        command.arg(command_line);
    }

    log::trace!("Shell command: {} {} {}", shell, flag, command_line);
    command
}
