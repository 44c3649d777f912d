//! Immutable snapshot of the port list.
//!
//! [`PortSnapshot`] is an **owned**, read-only list of port names as reported by the
//! device subsystem during one refresh cycle, in subsystem order (index `0..len`).
//! The polling loop builds a brand-new snapshot every cycle and publishes it behind an
//! `Arc`; readers never see one mutated in place.
//!
//! # Semantics
//! - The length is the length of the name sequence. There is no separate count field
//!   that could drift from it.
//! - Names are display names. Two ports may share a name; the index is the identity
//!   within one snapshot.
//!
//! # Example
//! ```
//! use portprobe::PortSnapshot;
//!
//! let snap = PortSnapshot::new(vec!["SynthA".into(), "ControllerB".into()]);
//! assert_eq!(snap.len(), 2);
//! assert_eq!(snap.get(1), Some("ControllerB"));
//! assert_eq!(snap.get(2), None);
//! ```

use serde::{Deserialize, Serialize};

/// Ordered port names from one enumeration pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortSnapshot {
    names: Vec<String>,
}

impl PortSnapshot {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Snapshot with no ports.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the port at `index`, if present.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Iterate names in subsystem order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Consume the snapshot and return the inner list.
    #[inline]
    pub fn into_inner(self) -> Vec<String> {
        self.names
    }
}

impl FromIterator<String> for PortSnapshot {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
