//! Helpers for driving real child processes in lifecycle tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Writes an executable shell script at `dir/name` and returns its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("script should be writable");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("script permissions should apply");
    }
    path
}

/// Writes a script that records its own pid to `pid_file` and then blocks.
pub fn write_blocking_script(dir: &Path, name: &str, pid_file: &Path) -> PathBuf {
    write_script(
        dir,
        name,
        &format!("#!/bin/sh\necho $$ > {}\nexec sleep 60\n", pid_file.display()),
    )
}

/// Probes whether a process with `pid` is still alive.
///
/// `EPERM` counts as alive: the process exists even though it is unowned.
pub fn process_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Polls until `probe` succeeds, returning `false` on timeout.
pub fn wait_for(probe: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if probe() {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    false
}
