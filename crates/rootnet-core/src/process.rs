//! Supervised helper processes.
//!
//! A [`Supervisor`] describes how to launch a helper; the resulting
//! [`SupervisedProcess`] is cancelled and reaped by its owner, or on drop
//! if the owner never did. With [`Supervisor::bind_to_parent`] the kernel
//! kills the helper if this process dies first.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

use rootnet_common::error::{Result, RootnetError};

/// Launch description for a helper process.
#[derive(Debug, Clone)]
pub struct Supervisor {
    program: PathBuf,
    args: Vec<OsString>,
    bind_to_parent: bool,
}

impl Supervisor {
    /// Starts a description for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            bind_to_parent: false,
        }
    }

    /// Appends arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Ties the helper's lifetime to this process.
    ///
    /// The kernel tracks the spawning thread, not the whole process, so
    /// spawn from a thread that lives at least as long as the helper should.
    #[must_use]
    pub fn bind_to_parent(mut self, enable: bool) -> Self {
        self.bind_to_parent = enable;
        self
    }

    /// Renders the command line for logs and error messages.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Starts the helper.
    ///
    /// Stdin and stdout are connected to `/dev/null`, keeping the caller's
    /// stdout free for its own output. Stderr is inherited so helper
    /// diagnostics reach the caller's log.
    ///
    /// # Errors
    ///
    /// Returns [`RootnetError::ProcessStartFailed`] if the process cannot
    /// be spawned.
    pub fn spawn(&self) -> Result<SupervisedProcess> {
        let mut cmd = Command::new(&self.program);
        let _ = cmd
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        if self.bind_to_parent {
            bind_lifetime(&mut cmd);
        }

        let child = cmd.spawn().map_err(|e| RootnetError::ProcessStartFailed {
            command: self.command_line(),
            source: e,
        })?;
        tracing::info!(pid = child.id(), command = %self.command_line(), "started helper");

        Ok(SupervisedProcess {
            child,
            command: self.command_line(),
            reaped: false,
        })
    }
}

/// Arranges for the child to receive `SIGKILL` when its parent exits.
#[cfg(target_os = "linux")]
fn bind_lifetime(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    use nix::sys::prctl;
    use nix::sys::signal::Signal;

    // SAFETY: the hook runs between fork and exec and only issues the
    // async-signal-safe prctl(2) syscall; it neither allocates nor locks.
    unsafe {
        let _ = cmd.pre_exec(|| {
            prctl::set_pdeathsig(Signal::SIGKILL).map_err(std::io::Error::from)
        });
    }
}

/// Lifetime binding needs `PR_SET_PDEATHSIG`, which only Linux provides.
#[cfg(not(target_os = "linux"))]
fn bind_lifetime(_cmd: &mut Command) {
    tracing::warn!("binding helper lifetime to the parent is not supported on this platform");
}

/// A running helper owned by the caller.
///
/// Dropping an unreaped helper shuts it down.
#[derive(Debug)]
pub struct SupervisedProcess {
    child: Child,
    command: String,
    reaped: bool,
}

impl SupervisedProcess {
    /// OS process identifier of the helper.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Command line the helper was started with.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the exit status if the helper has already exited.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be queried.
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>> {
        let status = self.child.try_wait().map_err(|e| self.io_error(e))?;
        self.reaped |= status.is_some();
        Ok(status)
    }

    /// Asks the helper to stop by sending `SIGKILL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be delivered.
    pub fn cancel(&mut self) -> Result<()> {
        self.child.kill().map_err(|e| self.io_error(e))
    }

    /// Blocks until the helper exits and reaps it.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait().map_err(|e| self.io_error(e))?;
        self.reaped = true;
        Ok(status)
    }

    /// Cancels, then always waits, so the helper never lingers as a
    /// zombie. Errors from either step are logged and swallowed.
    pub fn shutdown(&mut self) {
        tracing::debug!(pid = self.id(), "killing helper");
        if let Err(e) = self.cancel() {
            tracing::debug!(pid = self.id(), error = %e, "cancel failed");
        }
        match self.wait() {
            Ok(status) => tracing::debug!(pid = self.id(), %status, "killed helper"),
            Err(e) => tracing::warn!(pid = self.id(), error = %e, "waiting for helper failed"),
        }
    }

    fn io_error(&self, source: std::io::Error) -> RootnetError {
        RootnetError::Io {
            path: PathBuf::from(format!("/proc/{}", self.child.id())),
            source,
        }
    }
}

impl Drop for SupervisedProcess {
    fn drop(&mut self) {
        if !self.reaped {
            tracing::debug!(pid = self.id(), command = %self.command, "helper dropped while running");
            self.shutdown();
        }
    }
}
