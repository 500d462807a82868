// End-to-end checks of the `parashell` binary's exit codes.

use std::process::{Command, Output};

fn parashell(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parashell"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run the parashell binary")
}

#[test]
fn test_wait_and_first_together_exit_one_without_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let command = format!("touch '{}'", marker.display());

    let output = parashell(&["--wait", "--first", &command]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--wait and --first"));
    assert!(!marker.exists());
}

#[test]
fn test_no_commands_is_a_configuration_error() {
    let output = parashell(&["--wait"]);
    assert_eq!(output.status.code(), Some(1));
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::process::Stdio;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_all_success_exits_zero() {
        let output = parashell(&["echo one", "echo two"]);
        assert_eq!(output.status.code(), Some(0));

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("one"));
        assert!(stdout.contains("two"));
    }

    #[test]
    fn test_default_policy_exits_with_the_failing_code() {
        let output = parashell(&["sleep 30", "exit 2", "sleep 30"]);
        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_wait_policy_exits_zero_after_a_failure() {
        let output = parashell(&["--wait", "exit 0", "sleep 1; exit 3", "exit 0"]);
        assert_eq!(output.status.code(), Some(0));
    }

    #[test]
    fn test_first_policy_exits_with_the_first_code() {
        let output = parashell(&["--first", "sleep 30", "sleep 30", "exit 0"]);
        assert_eq!(output.status.code(), Some(0));
    }

    #[test]
    fn test_verbose_logs_the_lifecycle() {
        let output = parashell(&["--verbose", "exit 4"]);
        assert_eq!(output.status.code(), Some(4));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("failed with exit code: 4"));
    }

    #[test]
    fn test_non_utf8_command_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let output = Command::new(env!("CARGO_BIN_EXE_parashell"))
            .arg(OsStr::from_bytes(b"echo \xff"))
            .output()
            .expect("failed to run the parashell binary");

        assert_eq!(output.status.code(), Some(2));
        assert!(!String::from_utf8_lossy(&output.stdout).contains('\u{fffd}'));
    }

    #[test]
    fn test_interrupt_closes_every_command_and_exits_zero() {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survived");
        let late = format!("sleep 3 && touch '{}'", marker.display());

        let mut supervisor = Command::new(env!("CARGO_BIN_EXE_parashell"))
            .args(["sleep 30", late.as_str()])
            .env_remove("RUST_LOG")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to run the parashell binary");

        // Give the router and both commands time to start.
        thread::sleep(Duration::from_millis(500));
        kill(Pid::from_raw(supervisor.id() as i32), Signal::SIGINT).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let status = loop {
            if let Some(status) = supervisor.try_wait().unwrap() {
                break status;
            }
            if Instant::now() > deadline {
                let _ = supervisor.kill();
                panic!("parashell did not exit after SIGINT");
            }
            thread::sleep(Duration::from_millis(50));
        };
        assert_eq!(status.code(), Some(0));

        thread::sleep(Duration::from_secs(4));
        assert!(!marker.exists());
    }
}
