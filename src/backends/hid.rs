//! HID enumeration via `hidapi`.
//!
//! Every HID interface `hidapi` reports is one port. The display name is the product
//! string when the device provides one, otherwise `VID:PID` in hex.

use crate::error::{ProbeError, Result};
use crate::subsystem::{EnumerationHandle, PortSubsystem};
use hidapi::{DeviceInfo, HidApi};

/// [`PortSubsystem`] backed by a fresh `HidApi` context per handle.
#[derive(Clone, Copy, Debug, Default)]
pub struct HidSubsystem;

impl PortSubsystem for HidSubsystem {
    type Handle = HidHandle;

    fn acquire(&self) -> Result<HidHandle> {
        let api = HidApi::new().map_err(|e| ProbeError::Acquire(e.to_string()))?;
        Ok(HidHandle {
            api: Some(api),
            names: Vec::new(),
        })
    }
}

/// Open `hidapi` context. `port_count` re-scans the bus.
pub struct HidHandle {
    api: Option<HidApi>,
    names: Vec<String>,
}

fn display_name(info: &DeviceInfo) -> String {
    match info.product_string() {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => format!("{:04x}:{:04x}", info.vendor_id(), info.product_id()),
    }
}

impl EnumerationHandle for HidHandle {
    fn is_ok(&self) -> bool {
        self.api.is_some()
    }

    fn port_count(&mut self) -> Result<usize> {
        let api = self
            .api
            .as_mut()
            .ok_or_else(|| ProbeError::Query("hid context released".into()))?;
        api.refresh_devices()
            .map_err(|e| ProbeError::Query(e.to_string()))?;
        self.names = api.device_list().map(display_name).collect();
        Ok(self.names.len())
    }

    fn port_name(&mut self, index: usize) -> Result<String> {
        self.names
            .get(index)
            .cloned()
            .ok_or_else(|| ProbeError::Query(format!("hid port index {index} out of range")))
    }

    fn release(&mut self) {
        // Dropping the context closes hidapi.
        self.api = None;
        self.names.clear();
    }
}
