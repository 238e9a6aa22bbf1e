//! Jail containment: the id-backed guard for the FreeBSD backend.
//!
//! A jail is identified by the small integer the creation syscalls hand
//! back; removal is a single `jail_remove(2)` keyed by that id, which also
//! kills every process still attached. There is no accounting file to
//! sample, so destruction yields no statistics.

use corral_common::error::{CorralError, Result};
use corral_common::types::JailId;

use crate::guard::ContainerGuard;

/// Removes the jail with the given id, killing every process inside it.
///
/// # Errors
///
/// Returns an error if the `jail_remove(2)` syscall fails, for example
/// because the id no longer names a live jail.
#[cfg(target_os = "freebsd")]
pub fn remove_jail(jid: JailId) -> Result<()> {
    // SAFETY: jail_remove takes the id by value and touches no memory of ours.
    let rc = unsafe { libc::jail_remove(jid.as_raw()) };
    if rc == -1 {
        return Err(CorralError::Sys {
            call: "jail_remove",
            source: std::io::Error::last_os_error(),
        });
    }
    tracing::info!(%jid, "jail removed");
    Ok(())
}

/// Stub for platforms without jails.
///
/// # Errors
///
/// Always returns [`CorralError::Unsupported`].
#[cfg(not(target_os = "freebsd"))]
pub fn remove_jail(_jid: JailId) -> Result<()> {
    Err(CorralError::Unsupported { feature: "jails" })
}

/// Owning guard for one jail.
///
/// While armed, dropping the guard removes the jail with any error
/// suppressed. Call [`remove`](Self::remove) explicitly to see errors;
/// call [`disarm`](Self::disarm) or [`take`](Self::take) when the jail's
/// lifetime belongs to someone else, such as a child process that attached
/// to it.
///
/// Not `Clone`: two guards for one jail would race to remove it.
#[derive(Debug, Default)]
pub struct JailGuard {
    jid: Option<JailId>,
}

impl JailGuard {
    /// Takes ownership of an existing jail id.
    ///
    /// The caller must not remove the jail independently afterward.
    #[must_use]
    pub const fn new(jid: JailId) -> Self {
        Self { jid: Some(jid) }
    }

    /// Returns the owned jail id, if any.
    #[must_use]
    pub const fn jid(&self) -> Option<JailId> {
        self.jid
    }

    /// Disarms the guard and yields the jail id for hand-off.
    pub fn take(&mut self) -> Option<JailId> {
        self.jid.take()
    }

    /// Returns the guard to its default-constructed state.
    ///
    /// Does **not** remove an owned jail; call [`remove`](Self::remove)
    /// first if cleanup is required.
    pub fn reset(&mut self) {
        self.jid = None;
    }

    /// Removes the owned jail now. Disarmed guards (and repeated calls)
    /// are no-ops.
    ///
    /// # Errors
    ///
    /// Propagates [`remove_jail`] failures. The guard stays armed on
    /// failure, so scope exit still makes one suppressed attempt.
    pub fn remove(&mut self) -> Result<()> {
        let Some(jid) = self.jid else {
            return Ok(());
        };
        remove_jail(jid)?;
        self.jid = None;
        Ok(())
    }
}

impl ContainerGuard for JailGuard {
    type Stats = ();

    fn destroy(&mut self) -> Result<()> {
        self.remove()
    }

    fn disarm(&mut self) {
        self.jid = None;
    }

    fn is_armed(&self) -> bool {
        self.jid.is_some()
    }
}

impl Drop for JailGuard {
    fn drop(&mut self) {
        if self.jid.is_some() {
            if let Err(err) = self.remove() {
                tracing::warn!(%err, "suppressed jail removal failure");
            }
        }
    }
}
