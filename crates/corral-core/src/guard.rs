//! The common contract shared by all container guards.

use corral_common::error::Result;

/// An owning handle to at most one kernel containment resource.
///
/// A guard is *armed* while it holds an identifier. Dropping an armed guard
/// performs a best-effort [`destroy`](Self::destroy) with the error
/// suppressed; callers that need the error (or the final statistics) call
/// `destroy` explicitly before the guard leaves scope.
///
/// Guard types do not implement `Clone`, since duplicated ownership would
/// mean double destruction. Transfer happens through ordinary moves; assigning a
/// new guard over an old binding drops the old value, which tears down
/// whatever it still owned.
pub trait ContainerGuard {
    /// Accounting sample produced by destruction. `Default` is the
    /// nothing-was-measured value returned by no-op destroys.
    type Stats: Default;

    /// Destroys the owned container, killing any process tree inside it,
    /// and returns the last statistics sampled before removal.
    ///
    /// Idempotent: on a disarmed guard this performs no kernel work and
    /// returns `Stats::default()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container refuses to die within the retry
    /// budget or the removal syscall fails. The guard stays armed so that
    /// scope exit can make one more suppressed attempt.
    fn destroy(&mut self) -> Result<Self::Stats>;

    /// Releases the identifier without destroying the container.
    ///
    /// Used when the container's lifetime is handed to another owner, such
    /// as a child process that inherits it. After this, the guard is
    /// disarmed and dropping it does nothing.
    fn disarm(&mut self);

    /// Returns `true` while the guard owns an identifier.
    fn is_armed(&self) -> bool;
}
