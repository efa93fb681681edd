//! Child-process adapter: spawning, liveness, and escalating termination.

use crate::supervision::domain::{ServiceName, ServiceSpec};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// The OS refused to create a service process.
#[derive(Debug, Error)]
#[error("failed to spawn service {service} ({command}): {source}")]
pub struct SpawnError {
    /// Service that could not be spawned.
    pub service: ServiceName,
    /// Rendered command line.
    pub command: String,
    /// Underlying OS error.
    #[source]
    pub source: io::Error,
}

/// Pause between checks for surviving process-group members.
const GROUP_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A forced kill could not be delivered or confirmed.
#[derive(Debug, Error)]
pub enum StopError {
    /// The kill signal could not be delivered.
    #[error("failed to kill process group {pid}: {source}")]
    Kill {
        /// Process identifier of the group leader.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the terminated process failed.
    #[error("failed to reap process {pid}: {source}")]
    Reap {
        /// Process identifier.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
enum ProcessState {
    Spawned { pid: u32, child: Child },
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    Graceful,
    Forceful,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Delivered,
    ProcessGone,
}

/// Runtime record for one started service.
///
/// A handle is either backed by a real child process running in its own
/// process group, or simulated for dry runs. Simulated handles are never
/// signalled.
#[derive(Debug)]
pub struct ProcessHandle {
    spec: ServiceSpec,
    state: ProcessState,
    started_at: DateTime<Utc>,
}

impl ProcessHandle {
    /// Starts the service described by `spec`.
    ///
    /// With `dry_run` set, no process is created and a simulated handle is
    /// returned after logging the command. Otherwise the executable is
    /// spawned in a new process group with its output discarded.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] when the executable cannot be launched.
    pub fn start(spec: ServiceSpec, dry_run: bool, clock: &impl Clock) -> Result<Self, SpawnError> {
        let started_at = clock.utc();
        if dry_run {
            info!(
                service = %spec.name(),
                command = %spec.command(),
                "dry run: would start service"
            );
            return Ok(Self {
                spec,
                state: ProcessState::Simulated,
                started_at,
            });
        }

        let mut command = Command::new(spec.command().executable());
        command
            .args(spec.command().args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let spawn_error = |source: io::Error| SpawnError {
            service: spec.name().clone(),
            command: spec.command().command_line(),
            source,
        };
        let child = command.spawn().map_err(&spawn_error)?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_error(io::Error::other("spawned process has no pid")))?;

        info!(service = %spec.name(), pid, command = %spec.command(), "started service");
        Ok(Self {
            spec,
            state: ProcessState::Spawned { pid, child },
            started_at,
        })
    }

    /// Returns the originating spec.
    #[must_use]
    pub const fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    /// Returns the service name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        self.spec.name()
    }

    /// Returns the OS process id, or `None` for a simulated handle.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        match &self.state {
            ProcessState::Spawned { pid, .. } => Some(*pid),
            ProcessState::Simulated => None,
        }
    }

    /// Returns whether this handle was created by a dry run.
    #[must_use]
    pub const fn is_simulated(&self) -> bool {
        matches!(self.state, ProcessState::Simulated)
    }

    /// Returns when the service was started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Reports whether the process still exists.
    ///
    /// An exited process is reaped and reported as not running. Simulated
    /// handles are never running.
    pub fn is_running(&mut self) -> bool {
        let ProcessState::Spawned { pid, child } = &mut self.state else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(service = %self.spec.name(), pid = *pid, %status, "service has exited");
                false
            }
            Err(err) => {
                debug!(service = %self.spec.name(), pid = *pid, error = %err, "status query failed; probing process table");
                process_exists(*pid)
            }
        }
    }

    /// Stops the process group, escalating to a forced kill after `grace`.
    ///
    /// The graceful signal goes to the whole process group, even when the
    /// group leader has already exited, so background children of a wrapper
    /// script are stopped too. If the leader or any other member is still
    /// alive when `grace` elapses, the group is killed and the leader is
    /// reaped before returning. A group that is already gone counts as
    /// stopped.
    ///
    /// # Errors
    ///
    /// Returns [`StopError`] when the forced kill cannot be delivered or the
    /// process cannot be reaped.
    pub async fn stop(&mut self, grace: Duration) -> Result<(), StopError> {
        let service = self.spec.name();
        let ProcessState::Spawned {
            pid: spawned_pid,
            child,
        } = &mut self.state
        else {
            info!(%service, "dry run: would stop service");
            return Ok(());
        };
        let pid = *spawned_pid;
        let deadline = Instant::now() + grace;

        if let Ok(Some(status)) = child.try_wait() {
            debug!(%service, pid, %status, "service leader already exited; stopping its group");
        }

        let exited = match deliver(child, pid, StopSignal::Graceful) {
            Ok(Delivery::ProcessGone) => {
                debug!(%service, pid, "process group already gone");
                return reap(child, pid).await;
            }
            Ok(Delivery::Delivered) => {
                debug!(%service, pid, ?grace, "sent graceful termination signal");
                wait_for_exit(child, pid, deadline).await?
            }
            Err(err) => {
                warn!(%service, pid, error = %err, "graceful signal failed");
                false
            }
        };
        if exited {
            info!(%service, pid, "service stopped");
            return Ok(());
        }

        warn!(%service, pid, ?grace, "process group still alive; killing it");
        deliver(child, pid, StopSignal::Forceful).map_err(|source| StopError::Kill { pid, source })?;
        reap(child, pid).await?;
        info!(%service, pid, "service killed");
        Ok(())
    }
}

/// Waits until the leader is reaped and the rest of its group has gone, or
/// until `deadline`. Returns whether everything exited in time.
async fn wait_for_exit(child: &mut Child, pid: u32, deadline: Instant) -> Result<bool, StopError> {
    match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(Ok(_status)) => {}
        Ok(Err(source)) => return Err(StopError::Reap { pid, source }),
        Err(_elapsed) => return Ok(false),
    }
    loop {
        if !group_alive(pid) {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(GROUP_POLL_INTERVAL).await;
    }
}

async fn reap(child: &mut Child, pid: u32) -> Result<(), StopError> {
    child
        .wait()
        .await
        .map(drop)
        .map_err(|source| StopError::Reap { pid, source })
}

#[cfg(unix)]
fn deliver(_child: &mut Child, pid: u32, signal: StopSignal) -> io::Result<Delivery> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let group = i32::try_from(pid).map_err(io::Error::other)?;
    let os_signal = match signal {
        StopSignal::Graceful => Signal::SIGTERM,
        StopSignal::Forceful => Signal::SIGKILL,
    };
    match killpg(Pid::from_raw(group), os_signal) {
        Ok(()) => Ok(Delivery::Delivered),
        Err(Errno::ESRCH) => Ok(Delivery::ProcessGone),
        Err(errno) => Err(errno.into()),
    }
}

#[cfg(not(unix))]
fn deliver(child: &mut Child, _pid: u32, _signal: StopSignal) -> io::Result<Delivery> {
    match child.start_kill() {
        Ok(()) => Ok(Delivery::Delivered),
        Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(Delivery::ProcessGone),
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn process_exists(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    i32::try_from(pid).is_ok_and(|raw| kill(Pid::from_raw(raw), None).is_ok())
}

#[cfg(not(unix))]
const fn process_exists(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn group_alive(pid: u32) -> bool {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    i32::try_from(pid).is_ok_and(|group| killpg(Pid::from_raw(group), None).is_ok())
}

#[cfg(not(unix))]
const fn group_alive(_pid: u32) -> bool {
    false
}
