//! Background port enumeration.
//!
//! [`DevicePortProbe`] owns one enumeration handle and one polling thread. Every
//! poll interval the thread asks the subsystem for the port count and each name
//! *outside* any lock, then swaps the finished [`PortSnapshot`] into the shared slot
//! under a short critical section.
//!
//! Readers ([`PortReader`]) never wait on that lock. [`PortReader::port_count`] uses
//! `try_lock`. If the poller holds the lock at that instant, the reader keeps its
//! local cached snapshot, which is at most one refresh old. [`PortReader::port_name`]
//! only reads the local cache, so an index obtained from `port_count` always refers
//! to the same snapshot.
//!
//! # Lifecycle
//! - Construction never fails. If the subsystem cannot be opened (or the handle is
//!   not ok, or the thread cannot start) the failure is logged once and the probe
//!   reports zero ports for its whole lifetime. No thread is started and acquisition
//!   is never retried.
//! - [`DevicePortProbe::close`] stops the thread, joins it, then releases the handle.
//!   It is idempotent and also runs on drop.
//! - The parameterless `DevicePortProbe::new` needs the `midi` or `hid` feature. The
//!   default build only has [`DevicePortProbe::with_subsystem`].
//!
//! # Example
//! ```
//! use portprobe::{DevicePortProbe, ProbeConfig, VirtualSubsystem};
//!
//! let devices = VirtualSubsystem::new(["SynthA"]);
//! let mut probe = DevicePortProbe::with_subsystem(&devices, ProbeConfig::default());
//!
//! // Typically once per frame:
//! let n = probe.port_count();
//! for i in 0..n {
//!     println!("{i}: {}", probe.port_name(i).unwrap_or("?"));
//! }
//! probe.close();
//! ```

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::snapshot::PortSnapshot;
use crate::subsystem::{EnumerationHandle, OwnedHandle, PortSubsystem};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// State shared between the poller and every reader.
struct Shared {
    /// Currently published snapshot. Written only by the polling thread (and by
    /// `close` once the thread is gone).
    current: Mutex<Arc<PortSnapshot>>,
    /// Run flag for the polling loop.
    running: AtomicBool,
    /// True while a handle is held. Readers report no names once it drops.
    open: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(PortSnapshot::empty())),
            running: AtomicBool::new(false),
            open: AtomicBool::new(false),
        }
    }

    fn publish(&self, snapshot: Arc<PortSnapshot>) {
        *self.current.lock() = snapshot;
    }
}

/// Returned by the polling thread on a clean exit; releases the handle.
type Release = Box<dyn FnOnce() + Send>;

/// Polls a [`PortSubsystem`] on a dedicated thread and serves its port list to
/// any number of readers without blocking them.
pub struct DevicePortProbe {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<Release>>,
    reader: PortReader,
    available: bool,
    config: ProbeConfig,
}

impl DevicePortProbe {
    /// Probe over the system MIDI inputs with default settings.
    ///
    /// Only available with the `midi` or `hid` feature (MIDI is used when both are on).
    /// Without either, build the probe with [`with_subsystem`](Self::with_subsystem).
    #[cfg(feature = "midi")]
    #[cfg_attr(docsrs, doc(cfg(any(feature = "midi", feature = "hid"))))]
    pub fn new() -> Self {
        Self::with_subsystem(
            &crate::backends::MidiSubsystem::default(),
            ProbeConfig::default(),
        )
    }

    /// Probe over the system HID devices with default settings.
    ///
    /// Only available with the `midi` or `hid` feature (MIDI is used when both are on).
    /// Without either, build the probe with [`with_subsystem`](Self::with_subsystem).
    #[cfg(all(feature = "hid", not(feature = "midi")))]
    #[cfg_attr(docsrs, doc(cfg(any(feature = "midi", feature = "hid"))))]
    pub fn new() -> Self {
        Self::with_subsystem(&crate::backends::HidSubsystem, ProbeConfig::default())
    }

    /// Open `subsystem` and start polling it.
    ///
    /// Returns immediately; the first real snapshot shows up within one poll
    /// interval. An invalid `config` is logged and replaced by the defaults.
    pub fn with_subsystem<S: PortSubsystem>(subsystem: &S, config: ProbeConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!(error = %e, "invalid probe config, using defaults");
                ProbeConfig::default()
            }
        };

        let shared = Arc::new(Shared::new());
        let thread = match spawn_poller(subsystem, &config, &shared) {
            Ok(thread) => {
                info!(
                    interval_ms = config.poll_interval_ms,
                    "device port probe started"
                );
                Some(thread)
            }
            Err(e) => {
                warn!(error = %e, "device port probe unavailable, reporting no ports");
                None
            }
        };

        Self {
            reader: PortReader::new(Arc::clone(&shared)),
            available: thread.is_some(),
            shared,
            thread,
            config,
        }
    }

    /// A new reader with its own local cache. Readers are `Send` and may outlive the probe;
    /// after [`close`](Self::close) they report no ports.
    pub fn reader(&self) -> PortReader {
        PortReader::new(Arc::clone(&self.shared))
    }

    /// Non-blocking port count via the probe's own reader. See [`PortReader::port_count`].
    #[inline]
    pub fn port_count(&mut self) -> usize {
        self.reader.port_count()
    }

    /// Cached port name via the probe's own reader. See [`PortReader::port_name`].
    #[inline]
    pub fn port_name(&self, index: usize) -> Option<&str> {
        self.reader.port_name(index)
    }

    /// Snapshot cached by the probe's own reader.
    #[inline]
    pub fn snapshot(&self) -> Arc<PortSnapshot> {
        self.reader.snapshot()
    }

    /// Whether a handle was acquired and polling started at construction.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Whether the polling thread is currently alive.
    pub fn is_polling(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Effective configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Stop polling and release the handle.
    ///
    /// Clears the run flag, wakes and joins the polling thread, then releases the
    /// handle. Returns within the current enumeration pass; never waits out a full
    /// sleep. Calling it again (or dropping the probe afterwards) does nothing.
    pub fn close(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.shared.running.store(false, Ordering::Release);
        thread.thread().unpark();

        match thread.join() {
            Ok(release) => release(),
            // The handle owner was dropped, and released, while unwinding.
            Err(_) => warn!("port polling thread panicked"),
        }

        self.shared.open.store(false, Ordering::Release);
        self.shared.publish(Arc::new(PortSnapshot::empty()));
        info!("device port probe closed");
    }
}

#[cfg(any(feature = "midi", feature = "hid"))]
impl Default for DevicePortProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DevicePortProbe {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for DevicePortProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevicePortProbe")
            .field("available", &self.available)
            .field("polling", &self.is_polling())
            .field("config", &self.config)
            .field("cached", &self.reader.local)
            .finish()
    }
}

/// Acquire a handle and start the poller. On any error the handle (if any) has
/// already been released and `shared` is left closed.
fn spawn_poller<S: PortSubsystem>(
    subsystem: &S,
    config: &ProbeConfig,
    shared: &Arc<Shared>,
) -> Result<JoinHandle<Release>> {
    let mut owned = OwnedHandle::new(subsystem.acquire()?).ok_or(ProbeError::HandleNotOk)?;

    shared.running.store(true, Ordering::Release);
    shared.open.store(true, Ordering::Release);

    let worker = Arc::clone(shared);
    let interval = config.poll_interval();
    thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || {
            poll_loop(&worker, &mut owned, interval);
            Box::new(move || owned.release()) as Release
        })
        .map_err(|e| {
            shared.running.store(false, Ordering::Release);
            shared.open.store(false, Ordering::Release);
            ProbeError::Spawn(e)
        })
}

fn enumerate<H: EnumerationHandle>(handle: &mut H) -> Result<PortSnapshot> {
    let count = handle.port_count()?;
    (0..count).map(|i| handle.port_name(i)).collect()
}

fn poll_loop<H: EnumerationHandle>(
    shared: &Shared,
    owned: &mut OwnedHandle<H>,
    interval: Duration,
) {
    let mut last: Option<Arc<PortSnapshot>> = None;
    let mut failing = false;

    while shared.running.load(Ordering::Acquire) {
        let Some(handle) = owned.get_mut() else {
            break;
        };

        match enumerate(handle) {
            Ok(snapshot) => {
                if failing {
                    info!("port enumeration recovered");
                    failing = false;
                }
                let snapshot = Arc::new(snapshot);
                if last.as_deref() != Some(&*snapshot) {
                    info!(
                        count = snapshot.len(),
                        ports = ?snapshot.names(),
                        "port list changed"
                    );
                }
                trace!(count = snapshot.len(), "publishing port snapshot");
                shared.publish(Arc::clone(&snapshot));
                last = Some(snapshot);
            }
            // Skip this publish; readers keep the previous snapshot.
            Err(e) if !failing => {
                warn!(error = %e, "port enumeration failed, retrying next tick");
                failing = true;
            }
            Err(e) => debug!(error = %e, "port enumeration still failing"),
        }

        sleep_until(shared, Instant::now() + interval);
    }

    debug!("port polling loop exited");
}

/// Sleep until `deadline`, returning early once the run flag clears.
fn sleep_until(shared: &Shared, deadline: Instant) {
    while shared.running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::park_timeout(deadline - now);
    }
}

/// Per-caller view of the probe's port list.
///
/// Each reader keeps its own cached snapshot (its LocalCache). Clone one per thread, or
/// get fresh ones from [`DevicePortProbe::reader`].
#[derive(Clone)]
pub struct PortReader {
    shared: Arc<Shared>,
    local: Arc<PortSnapshot>,
}

impl PortReader {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            local: Arc::new(PortSnapshot::empty()),
        }
    }

    /// Number of ports. Never blocks.
    ///
    /// Refreshes the local cache if the shared lock is free; otherwise returns the
    /// cached count unchanged.
    pub fn port_count(&mut self) -> usize {
        if let Some(current) = self.shared.current.try_lock() {
            if !Arc::ptr_eq(&self.local, &current) {
                self.local = Arc::clone(&current);
            }
        }
        self.local.len()
    }

    /// Name of port `index` from the local cache, as of the last [`port_count`](Self::port_count).
    ///
    /// `None` if the probe has no handle (never acquired, or closed) or if `index` is
    /// outside the cached snapshot. Takes no lock and makes no subsystem call.
    pub fn port_name(&self, index: usize) -> Option<&str> {
        if !self.shared.open.load(Ordering::Acquire) {
            return None;
        }
        self.local.get(index)
    }

    /// The cached snapshot itself.
    pub fn snapshot(&self) -> Arc<PortSnapshot> {
        Arc::clone(&self.local)
    }

    /// Whether the probe behind this reader still holds a handle.
    pub fn is_available(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }
}

impl fmt::Debug for PortReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortReader")
            .field("available", &self.is_available())
            .field("cached", &self.local)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::VirtualSubsystem;

    fn fast() -> ProbeConfig {
        ProbeConfig::default().with_poll_interval(Duration::from_millis(5))
    }

    fn wait_for(reader: &mut PortReader, want: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if reader.port_count() == want {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn reader_keeps_stale_cache_while_lock_is_held() {
        let devices = VirtualSubsystem::new(["X"]);
        let probe = DevicePortProbe::with_subsystem(&devices, fast());
        let mut reader = probe.reader();
        assert!(wait_for(&mut reader, 1));

        let guard = probe.shared.current.lock();
        devices.set_ports(["X", "Y"]);
        // Poller is now stuck behind `guard`; the reader must not be.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(reader.port_count(), 1);
        assert_eq!(reader.port_name(0), Some("X"));
        drop(guard);

        assert!(wait_for(&mut reader, 2));
        assert_eq!(reader.port_name(1), Some("Y"));
    }

    #[test]
    fn readers_have_independent_caches() {
        let devices = VirtualSubsystem::new(["X"]);
        let probe = DevicePortProbe::with_subsystem(&devices, fast());
        let mut a = probe.reader();
        let b = probe.reader();

        assert!(wait_for(&mut a, 1));
        assert_eq!(a.port_name(0), Some("X"));
        // `b` never called port_count, so it still has the initial empty cache.
        assert_eq!(b.port_name(0), None);
        assert!(b.snapshot().is_empty());
    }

    #[test]
    fn not_ok_handle_degrades_without_thread() {
        let devices = VirtualSubsystem::not_ok();
        let mut probe = DevicePortProbe::with_subsystem(&devices, fast());
        assert!(!probe.is_available());
        assert!(!probe.is_polling());
        assert_eq!(probe.port_count(), 0);
        assert_eq!(probe.port_name(0), None);
        drop(probe);
        assert_eq!(devices.release_count(), 0);
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let devices = VirtualSubsystem::new(["X"]);
        let cfg = ProbeConfig::default().with_poll_interval(Duration::ZERO);
        let probe = DevicePortProbe::with_subsystem(&devices, cfg);
        assert!(probe.is_available());
        assert_eq!(probe.config(), &ProbeConfig::default());
    }

    #[test]
    fn nul_thread_name_falls_back_to_defaults() {
        let devices = VirtualSubsystem::new(["X"]);
        let cfg = ProbeConfig::default().with_thread_name("scan\0er");
        let mut probe = DevicePortProbe::with_subsystem(&devices, cfg);
        assert!(probe.is_available());
        assert!(probe.is_polling());
        assert_eq!(probe.config().thread_name, crate::config::DEFAULT_THREAD_NAME);

        let mut reader = probe.reader();
        assert!(wait_for(&mut reader, 1));
        probe.close();
    }

    #[test]
    fn query_failure_keeps_previous_snapshot() {
        let devices = VirtualSubsystem::new(["X"]);
        let mut probe = DevicePortProbe::with_subsystem(&devices, fast());
        let mut reader = probe.reader();
        assert!(wait_for(&mut reader, 1));

        devices.set_query_failure(true);
        devices.set_ports(Vec::<String>::new());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(reader.port_count(), 1);
        assert!(probe.is_polling());

        devices.set_query_failure(false);
        assert!(wait_for(&mut reader, 0));
        probe.close();
    }

    #[test]
    fn close_empties_readers() {
        let devices = VirtualSubsystem::new(["X"]);
        let mut probe = DevicePortProbe::with_subsystem(&devices, fast());
        let mut reader = probe.reader();
        assert!(wait_for(&mut reader, 1));

        probe.close();
        assert!(!reader.is_available());
        assert_eq!(reader.port_name(0), None);
        assert_eq!(reader.port_count(), 0);
        assert_eq!(devices.live_handles(), 0);
    }
}
