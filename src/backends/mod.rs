//! Port subsystems for `portprobe`.
//!
//! Implementations of [`PortSubsystem`](crate::subsystem::PortSubsystem).
//!
//! # Feature flags
//! - **`midi`** — enables the MIDI input backend over `midir` ([`midi::MidiSubsystem`]).
//! - **`hid`** — enables the `hidapi` backend ([`hid::HidSubsystem`]).
//!
//! With either feature on, [`DevicePortProbe::new`](crate::probe::DevicePortProbe::new)
//! probes the system subsystem; `midi` wins when both are enabled.
//!
//! The in-memory [`virtual_ports::VirtualSubsystem`] is always available; tests and demos
//! drive the probe with it.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

#[cfg(feature = "midi")]
#[cfg_attr(docsrs, doc(cfg(feature = "midi")))]
pub mod midi;

pub mod virtual_ports;

#[cfg(feature = "hid")]
pub use hid::HidSubsystem;
#[cfg(feature = "midi")]
pub use midi::MidiSubsystem;
pub use virtual_ports::VirtualSubsystem;
