//! Device subsystem contract.
//!
//! A [`PortSubsystem`] is whatever can list input ports: a MIDI API, `hidapi`, or the
//! in-memory [`VirtualSubsystem`](crate::backends::virtual_ports::VirtualSubsystem).
//! The probe only ever asks it for an [`EnumerationHandle`] and then, from its polling
//! thread, for a count and a name per index. It never opens ports or moves messages.

use crate::error::Result;

/// Source of enumeration handles.
pub trait PortSubsystem {
    type Handle: EnumerationHandle;

    /// Open the subsystem's enumeration interface.
    fn acquire(&self) -> Result<Self::Handle>;
}

/// An open connection to a subsystem's enumeration interface.
///
/// Handles move to the polling thread, hence `Send + 'static`.
pub trait EnumerationHandle: Send + 'static {
    /// Whether the handle is usable. A handle that is not ok is dropped without
    /// being released.
    fn is_ok(&self) -> bool;

    /// Number of ports currently available.
    ///
    /// Implementations may refresh their device list here; [`port_name`](Self::port_name)
    /// indices refer to the list observed by the latest call.
    fn port_count(&mut self) -> Result<usize>;

    /// Display name of the port at `index` (`index < port_count()`).
    fn port_name(&mut self, index: usize) -> Result<String>;

    /// Hand the handle back to the subsystem. Called at most once per handle,
    /// through [`OwnedHandle`].
    fn release(&mut self);
}

/// Exclusive owner of an acquired, ok handle.
///
/// Calls [`EnumerationHandle::release`] exactly once: on [`release`](Self::release)
/// or on drop, whichever comes first.
pub struct OwnedHandle<H: EnumerationHandle> {
    inner: Option<H>,
}

impl<H: EnumerationHandle> OwnedHandle<H> {
    /// Take ownership of `handle`. Returns `None` (dropping it unreleased) if the
    /// handle is not ok.
    pub fn new(handle: H) -> Option<Self> {
        if handle.is_ok() {
            Some(Self {
                inner: Some(handle),
            })
        } else {
            None
        }
    }

    /// Borrow the live handle, or `None` once released.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut H> {
        self.inner.as_mut()
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    /// Release now. Further calls (and the drop) do nothing.
    pub fn release(&mut self) {
        if let Some(mut handle) = self.inner.take() {
            handle.release();
            tracing::debug!("released enumeration handle");
        }
    }
}

impl<H: EnumerationHandle> Drop for OwnedHandle<H> {
    fn drop(&mut self) {
        self.release();
    }
}
