//! In-memory port subsystem.
//!
//! [`VirtualSubsystem`] is a scriptable stand-in for a real device API. The port list
//! lives behind a shared lock, so a test or demo keeps one clone as a "controller" and
//! hands another to [`DevicePortProbe::with_subsystem`](crate::probe::DevicePortProbe::with_subsystem),
//! then plugs and unplugs ports while the probe polls.
//!
//! It can also simulate the failure modes of a real backend:
//! - [`VirtualSubsystem::failing`]: `acquire` always errors
//! - [`VirtualSubsystem::not_ok`]: `acquire` returns a handle that reports not ok
//! - [`VirtualSubsystem::set_query_failure`]: count/name queries error until cleared
//!
//! Acquire/release counters let callers check handle lifecycle.

use crate::error::{ProbeError, Result};
use crate::subsystem::{EnumerationHandle, PortSubsystem};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct VirtualState {
    ports: Vec<String>,
    fail_acquire: bool,
    handle_not_ok: bool,
    fail_queries: bool,
    acquired: usize,
    released: usize,
}

/// Shared, cloneable in-memory subsystem. All clones see the same port list.
#[derive(Clone, Debug, Default)]
pub struct VirtualSubsystem {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualSubsystem {
    /// Subsystem currently reporting `ports`, in order.
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sub = Self::default();
        sub.set_ports(ports);
        sub
    }

    /// Subsystem that can never be opened.
    pub fn failing() -> Self {
        let sub = Self::default();
        sub.state.lock().fail_acquire = true;
        sub
    }

    /// Subsystem that opens, but hands back a handle reporting not ok.
    pub fn not_ok() -> Self {
        let sub = Self::default();
        sub.state.lock().handle_not_ok = true;
        sub
    }

    /// Replace the whole port list.
    pub fn set_ports<I, S>(&self, ports: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().ports = ports.into_iter().map(Into::into).collect();
    }

    /// Append a port at the end of the list.
    pub fn plug(&self, name: impl Into<String>) {
        self.state.lock().ports.push(name.into());
    }

    /// Remove the first port with this name. Returns whether one was removed.
    pub fn unplug(&self, name: &str) -> bool {
        let mut st = self.state.lock();
        match st.ports.iter().position(|p| p == name) {
            Some(i) => {
                st.ports.remove(i);
                true
            }
            None => false,
        }
    }

    /// Make every count/name query fail (`true`) or succeed again (`false`).
    pub fn set_query_failure(&self, fail: bool) {
        self.state.lock().fail_queries = fail;
    }

    /// Current port list as the subsystem sees it.
    pub fn ports(&self) -> Vec<String> {
        self.state.lock().ports.clone()
    }

    /// Number of successful `acquire` calls.
    pub fn acquire_count(&self) -> usize {
        self.state.lock().acquired
    }

    /// Number of `release` calls received.
    pub fn release_count(&self) -> usize {
        self.state.lock().released
    }

    /// Handles acquired and not yet released.
    pub fn live_handles(&self) -> usize {
        let st = self.state.lock();
        st.acquired - st.released
    }
}

impl PortSubsystem for VirtualSubsystem {
    type Handle = VirtualHandle;

    fn acquire(&self) -> Result<VirtualHandle> {
        let mut st = self.state.lock();
        if st.fail_acquire {
            return Err(ProbeError::Acquire("virtual subsystem unavailable".into()));
        }
        st.acquired += 1;
        Ok(VirtualHandle {
            state: Arc::clone(&self.state),
            ok: !st.handle_not_ok,
            seen: Vec::new(),
        })
    }
}

/// Enumeration handle over a [`VirtualSubsystem`].
///
/// `port_count` copies the live list; `port_name` reads that copy, so indices stay
/// valid even if the list changes between the two calls.
#[derive(Debug)]
pub struct VirtualHandle {
    state: Arc<Mutex<VirtualState>>,
    ok: bool,
    seen: Vec<String>,
}

impl EnumerationHandle for VirtualHandle {
    fn is_ok(&self) -> bool {
        self.ok
    }

    fn port_count(&mut self) -> Result<usize> {
        let st = self.state.lock();
        if st.fail_queries {
            return Err(ProbeError::Query("virtual port count failed".into()));
        }
        self.seen.clone_from(&st.ports);
        Ok(self.seen.len())
    }

    fn port_name(&mut self, index: usize) -> Result<String> {
        if self.state.lock().fail_queries {
            return Err(ProbeError::Query("virtual port name failed".into()));
        }
        self.seen
            .get(index)
            .cloned()
            .ok_or_else(|| ProbeError::Query(format!("port index {index} out of range")))
    }

    fn release(&mut self) {
        self.state.lock().released += 1;
    }
}
