//! Domain primitive types used across the corral workspace.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Accounting sample taken from a container just before destruction.
///
/// Each field is `None` when the backing record did not exist; a missing
/// controller is a normal platform configuration, not a fault. The backing
/// records disappear together with the container, so a snapshot is only
/// meaningful if captured before removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    /// CPU time spent in user mode by all processes ever in the container.
    pub cpu_user: Option<Duration>,
    /// CPU time spent in kernel mode by all processes ever in the container.
    pub cpu_system: Option<Duration>,
}

impl ResourceStats {
    /// Returns `true` when no field carries a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cpu_user.is_none() && self.cpu_system.is_none()
    }
}

/// Identifier of a jail, as returned by the jail-creation syscalls.
///
/// Valid ids are positive; the kernel never hands out a negative one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JailId(i32);

impl JailId {
    /// Wraps a raw jail id.
    #[must_use]
    pub const fn new(jid: i32) -> Self {
        Self(jid)
    }

    /// Returns the raw id for syscall interop.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl From<i32> for JailId {
    fn from(jid: i32) -> Self {
        Self::new(jid)
    }
}

impl From<JailId> for i32 {
    fn from(jid: JailId) -> Self {
        jid.as_raw()
    }
}

impl fmt::Display for JailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_report_empty() {
        assert!(ResourceStats::default().is_empty());
    }

    #[test]
    fn partial_stats_are_not_empty() {
        let stats = ResourceStats {
            cpu_user: Some(Duration::from_micros(12)),
            cpu_system: None,
        };
        assert!(!stats.is_empty());
    }

    #[test]
    fn jail_id_roundtrips_raw_value() {
        let jid = JailId::new(42);
        assert_eq!(jid.as_raw(), 42);
        assert_eq!(i32::from(jid), 42);
        assert_eq!(JailId::from(42), jid);
        assert_eq!(jid.to_string(), "42");
    }
}
