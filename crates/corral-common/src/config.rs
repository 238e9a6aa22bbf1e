//! Tuning knobs for container destruction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry budget for the kill loop that empties a cgroup before removal.
///
/// Destroying a cgroup requires every member process to be gone first.
/// Members are killed and the membership list re-polled until it empties or
/// this budget is exhausted; exhaustion is a fatal error, never a silent
/// success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillPolicy {
    /// Maximum number of kill/poll rounds. A value of `0` is treated as
    /// `1`; destruction always makes at least one attempt.
    pub max_attempts: u32,
    /// Pause between rounds, giving the kernel time to reap the killed
    /// processes.
    pub backoff: Duration,
}

impl Default for KillPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::DEFAULT_KILL_ATTEMPTS,
            backoff: Duration::from_millis(crate::constants::DEFAULT_KILL_BACKOFF_MS),
        }
    }
}

impl KillPolicy {
    /// Number of rounds the kill loop will actually run.
    #[must_use]
    pub const fn effective_attempts(&self) -> u32 {
        if self.max_attempts == 0 { 1 } else { self.max_attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_bounded() {
        let policy = KillPolicy::default();
        assert!(policy.max_attempts > 0);
        assert!(policy.backoff > Duration::ZERO);
    }

    #[test]
    fn zero_attempts_still_makes_one() {
        let policy = KillPolicy {
            max_attempts: 0,
            backoff: Duration::from_millis(1),
        };
        assert_eq!(policy.effective_attempts(), 1);
    }

    #[test]
    fn policy_roundtrips_through_json() {
        let policy = KillPolicy {
            max_attempts: 7,
            backoff: Duration::from_millis(5),
        };
        let json = serde_json::to_string(&policy).expect("serialize");
        let back: KillPolicy = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, policy);
    }
}
