//! Shared, ordered collection of started services.

use super::shutdown::{ShutdownReport, stop_all};
use crate::supervision::{
    adapters::{ProcessHandle, SpawnError},
    domain::{ServiceName, ServiceSpec},
};
use mockable::Clock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Outcome of asking a [`ServiceSet`] to start one more service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// The service was started (or simulated) and added to the set.
    Started {
        /// Whether the new handle is a dry-run simulation.
        simulated: bool,
    },
    /// The set has been stopped; nothing was spawned.
    Closed,
}

#[derive(Debug)]
struct SetInner {
    handles: Mutex<Vec<ProcessHandle>>,
    closed: watch::Sender<bool>,
}

/// Ordered set of services believed to be live.
///
/// Order is start order. Clones share the same underlying set, so one clone
/// can be moved into a cleanup action while another is filled by the
/// launcher. Stopping takes every handle out of the set and closes it: a
/// closed set spawns nothing further, so each service is stopped at most once
/// across all clones and no service can start after shutdown began.
#[derive(Debug, Clone)]
pub struct ServiceSet {
    inner: Arc<SetInner>,
}

impl Default for ServiceSet {
    fn default() -> Self {
        Self {
            inner: Arc::new(SetInner {
                handles: Mutex::new(Vec::new()),
                closed: watch::Sender::new(false),
            }),
        }
    }
}

impl ServiceSet {
    /// Creates an empty, open set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of services in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns whether [`Self::stop_all`] has run on any clone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Returns service names in start order.
    #[must_use]
    pub fn names(&self) -> Vec<ServiceName> {
        self.lock()
            .iter()
            .map(|handle| handle.name().clone())
            .collect()
    }

    /// Returns the process id of a service, or `None` when the service is
    /// unknown or simulated.
    #[must_use]
    pub fn pid_of(&self, name: &ServiceName) -> Option<u32> {
        self.lock()
            .iter()
            .find(|handle| handle.name() == name)
            .and_then(ProcessHandle::pid)
    }

    /// Reports whether the named service is still running.
    ///
    /// Unknown services are reported as not running.
    #[must_use]
    pub fn is_running(&self, name: &ServiceName) -> bool {
        self.lock()
            .iter_mut()
            .find(|handle| handle.name() == name)
            .is_some_and(ProcessHandle::is_running)
    }

    /// Closes the set, then stops every service in reverse start order.
    pub async fn stop_all<C>(&self, clock: &C) -> ShutdownReport
    where
        C: Clock + Sync + ?Sized,
    {
        let handles = self.close_and_take();
        stop_all(handles, clock).await
    }

    /// Resolves once the set has been closed.
    pub async fn closed(&self) {
        let mut receiver = self.inner.closed.subscribe();
        // The sender lives as long as `self`, so waiting cannot fail.
        let _sender_alive = receiver.wait_for(|closed| *closed).await.is_ok();
    }

    /// Starts `spec` and appends its handle, unless the set is closed.
    ///
    /// The spawn happens under the set's lock, so a concurrent
    /// [`Self::stop_all`] either sees the new handle or prevents the spawn.
    pub(crate) fn start_service<C>(
        &self,
        spec: &ServiceSpec,
        dry_run: bool,
        clock: &C,
    ) -> Result<Admission, SpawnError>
    where
        C: Clock,
    {
        let mut handles = self.lock();
        if self.is_closed() {
            return Ok(Admission::Closed);
        }
        let handle = ProcessHandle::start(spec.clone(), dry_run, clock)?;
        let simulated = handle.is_simulated();
        handles.push(handle);
        Ok(Admission::Started { simulated })
    }

    fn close_and_take(&self) -> Vec<ProcessHandle> {
        let mut handles = self.lock();
        self.inner.closed.send_replace(true);
        std::mem::take(&mut *handles)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProcessHandle>> {
        self.inner
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
