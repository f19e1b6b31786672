// src/exec/spawner.rs

//! Starting shell commands with non-blocking pipes in their own process group.

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use tokio::io::unix::AsyncFd;
use tracing::{debug, trace};

/// Parent-side read end of a child's stdout or stderr.
pub type OutputPipe = AsyncFd<File>;

/// A polling child together with the parent ends of its pipes.
///
/// The child is the leader of its own process group, so `pgid == pid`.
#[derive(Debug)]
pub struct SpawnedChild {
    pub child: Child,
    pub pid: u32,
    pub stdin: Option<File>,
    pub stdout: Option<OutputPipe>,
    pub stderr: Option<OutputPipe>,
}

impl SpawnedChild {
    pub fn pgid(&self) -> u32 {
        self.pid
    }

    /// Both output pipes have reported end of file.
    pub fn outputs_closed(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }
}

fn shell(command: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command).process_group(0);
    cmd
}

/// Run `command` through `/bin/sh -c` with stdout and stderr piped, and a
/// stdin pipe only when `with_stdin` is set.
///
/// Must be called from inside a tokio runtime (the pipes are registered with
/// its reactor).
pub fn spawn_piped(command: &str, with_stdin: bool) -> io::Result<SpawnedChild> {
    let mut cmd = shell(command);
    cmd.stdin(if with_stdin {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let pid = child.id();

    let stdin = child.stdin.take().map(nonblocking).transpose();
    let stdout = child.stdout.take().map(registered).transpose();
    let stderr = child.stderr.take().map(registered).transpose();

    let (stdin, stdout, stderr) = match (stdin, stdout, stderr) {
        (Ok(i), Ok(o), Ok(e)) => (i, o, e),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            // Do not leave a half-wired child behind.
            signal_group(pid, libc::SIGKILL);
            let _ = child.wait();
            return Err(e);
        }
    };

    debug!(pid, interactive = stdin.is_some(), "spawned piped child");
    Ok(SpawnedChild {
        child,
        pid,
        stdin,
        stdout,
        stderr,
    })
}

/// Run `command` detached from the executor's pipes, with extra environment.
pub fn spawn_detached(command: &str, env: &[(&str, String)]) -> io::Result<Child> {
    let mut cmd = shell(command);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());
    for (key, value) in env {
        cmd.env(key, value);
    }
    let child = cmd.spawn()?;
    debug!(pid = child.id(), "spawned detached child");
    Ok(child)
}

fn nonblocking<F: Into<OwnedFd>>(end: F) -> io::Result<File> {
    let file = File::from(end.into());
    set_nonblocking(&file)?;
    Ok(file)
}

fn registered<F: Into<OwnedFd>>(end: F) -> io::Result<OutputPipe> {
    AsyncFd::new(nonblocking(end)?)
}

fn set_nonblocking(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();
    // SAFETY: `fd` is owned by `file` and stays open for both calls.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Send `signal` to every process in group `pgid`. Errors (typically
/// `ESRCH` for an already-gone group) are only traced.
pub fn signal_group(pgid: u32, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    if pgid <= 0 {
        return;
    }
    // SAFETY: killpg has no memory-safety preconditions.
    if unsafe { libc::killpg(pgid, signal) } < 0 {
        trace!(pgid, signal, error = %io::Error::last_os_error(), "killpg failed");
    }
}
