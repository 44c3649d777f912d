//! MIDI input port enumeration via `midir`.
//!
//! One handle is one `MidiInput` client with no connections. It only lists ports;
//! opening them stays with the host application.
//!
//! `port_count` re-reads the system port list and keeps it, so `port_name(i)` names
//! the port seen by the latest count even if devices change in between.

use crate::error::{ProbeError, Result};
use crate::subsystem::{EnumerationHandle, PortSubsystem};
use midir::{MidiInput, MidiInputPort};

/// Client name registered with the MIDI API when none is given.
pub const DEFAULT_CLIENT_NAME: &str = "portprobe";

/// [`PortSubsystem`] over the platform MIDI API (ALSA, CoreMIDI, WinMM, ...).
#[derive(Clone, Debug)]
pub struct MidiSubsystem {
    client_name: String,
}

impl MidiSubsystem {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

impl Default for MidiSubsystem {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_NAME)
    }
}

impl PortSubsystem for MidiSubsystem {
    type Handle = MidiHandle;

    fn acquire(&self) -> Result<MidiHandle> {
        let input =
            MidiInput::new(&self.client_name).map_err(|e| ProbeError::Acquire(e.to_string()))?;
        Ok(MidiHandle {
            input: Some(input),
            ports: Vec::new(),
        })
    }
}

/// Open MIDI input client used for enumeration only.
pub struct MidiHandle {
    input: Option<MidiInput>,
    ports: Vec<MidiInputPort>,
}

impl EnumerationHandle for MidiHandle {
    fn is_ok(&self) -> bool {
        self.input.is_some()
    }

    fn port_count(&mut self) -> Result<usize> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| ProbeError::Query("midi client released".into()))?;
        self.ports = input.ports();
        Ok(self.ports.len())
    }

    fn port_name(&mut self, index: usize) -> Result<String> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| ProbeError::Query("midi client released".into()))?;
        let port = self
            .ports
            .get(index)
            .ok_or_else(|| ProbeError::Query(format!("midi port index {index} out of range")))?;
        // A port unplugged since the count fails here; the cycle is skipped.
        input
            .port_name(port)
            .map_err(|e| ProbeError::Query(e.to_string()))
    }

    fn release(&mut self) {
        // Dropping the client closes it.
        self.input = None;
        self.ports.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn released() -> MidiHandle {
        MidiHandle {
            input: None,
            ports: Vec::new(),
        }
    }

    #[test]
    fn default_client_name() {
        assert_eq!(MidiSubsystem::default().client_name(), DEFAULT_CLIENT_NAME);
        assert_eq!(MidiSubsystem::new("scope").client_name(), "scope");
    }

    #[test]
    fn released_handle_is_not_ok_and_refuses_queries() {
        let mut h = released();
        assert!(!h.is_ok());
        assert!(matches!(h.port_count(), Err(ProbeError::Query(_))));
        assert!(matches!(h.port_name(0), Err(ProbeError::Query(_))));
    }

    #[test]
    fn release_drops_the_client() {
        // Without a MIDI service (e.g. headless CI) acquisition fails; nothing to check then.
        let Ok(mut h) = MidiSubsystem::default().acquire() else {
            return;
        };
        assert!(h.is_ok());
        let count = h.port_count().unwrap();
        assert!(h.port_name(count).is_err());

        h.release();
        assert!(!h.is_ok());
        assert!(h.port_count().is_err());
    }
}
