//! portprobe — background enumeration of input device ports.
//!
//! A [`DevicePortProbe`] polls a device subsystem (MIDI, HID, ...) for its list of
//! input ports on a dedicated thread and publishes each result as an immutable
//! [`PortSnapshot`]. Callers on any thread read it through a [`PortReader`] without
//! ever blocking, which makes the probe safe to query once per rendered frame.
//!
//! The probe only discovers and names ports. Opening them and moving messages is
//! the subsystem's business.

pub mod backends;
pub mod config;
pub mod error;
pub mod probe;
pub mod snapshot;
pub mod subsystem;

pub use backends::VirtualSubsystem;
pub use config::ProbeConfig;
pub use error::{ProbeError, Result};
pub use probe::{DevicePortProbe, PortReader};
pub use snapshot::PortSnapshot;
pub use subsystem::{EnumerationHandle, OwnedHandle, PortSubsystem};
