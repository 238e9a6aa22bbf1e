//! Cgroups v2 containment: the path-backed guard and its destroy algorithm.
//!
//! A sub-cgroup doubles as a kill boundary: destroying it takes down the
//! whole process tree inside in one operation, with no chance of missing a
//! double-forked straggler. The kernel refuses to remove a cgroup that
//! still has members, so the destroy algorithm kills and re-polls under a
//! bounded retry budget before it samples accounting and unlinks the
//! directory.

pub mod hierarchy;
pub mod stats;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use corral_common::config::KillPolicy;
use corral_common::error::{CorralError, Result};
use corral_common::types::ResourceStats;

use crate::guard::ContainerGuard;

/// Owning guard for one cgroup directory.
///
/// While armed, dropping the guard destroys the cgroup (including its
/// process tree and descendant cgroups) with any error suppressed. Call
/// [`destroy`](Self::destroy) explicitly to get the final accounting sample
/// and see errors; call [`disarm`](Self::disarm) or [`take`](Self::take) to
/// hand the cgroup's lifetime to another owner instead.
///
/// Not `Clone`: two guards for one cgroup would race to destroy it.
#[derive(Debug, Default)]
pub struct CgroupGuard {
    path: Option<PathBuf>,
    policy: KillPolicy,
}

impl CgroupGuard {
    /// Takes ownership of an existing cgroup directory.
    ///
    /// The caller must not remove the cgroup independently afterward.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            policy: KillPolicy::default(),
        }
    }

    /// Like [`new`](Self::new), with an explicit kill retry budget.
    #[must_use]
    pub fn with_policy(path: impl Into<PathBuf>, policy: KillPolicy) -> Self {
        Self {
            path: Some(path.into()),
            policy,
        }
    }

    /// Returns the owned cgroup directory, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Disarms the guard and yields the cgroup path for hand-off.
    pub fn take(&mut self) -> Option<PathBuf> {
        self.path.take()
    }

    /// Returns the guard to its default-constructed state.
    ///
    /// Does **not** destroy an owned cgroup; call
    /// [`destroy`](Self::destroy) first if cleanup is required.
    pub fn reset(&mut self) {
        self.path = None;
        self.policy = KillPolicy::default();
    }

    /// Destroys the owned cgroup now and returns its final accounting
    /// sample. Disarmed guards (and repeated calls) are no-ops returning an
    /// empty sample.
    ///
    /// # Errors
    ///
    /// Propagates [`destroy_cgroup_with`] failures. The guard stays armed
    /// on failure, so scope exit still makes one suppressed attempt.
    pub fn destroy(&mut self) -> Result<ResourceStats> {
        let Some(path) = self.path.take() else {
            return Ok(ResourceStats::default());
        };
        match destroy_cgroup_with(&path, &self.policy) {
            Ok(stats) => Ok(stats),
            Err(err) => {
                self.path = Some(path);
                Err(err)
            }
        }
    }
}

impl ContainerGuard for CgroupGuard {
    type Stats = ResourceStats;

    fn destroy(&mut self) -> Result<ResourceStats> {
        Self::destroy(self)
    }

    fn disarm(&mut self) {
        self.path = None;
    }

    fn is_armed(&self) -> bool {
        self.path.is_some()
    }
}

impl Drop for CgroupGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(err) = destroy_cgroup_with(&path, &self.policy) {
                tracing::warn!(cgroup = %path.display(), %err, "suppressed cgroup teardown failure");
            }
        }
    }
}

/// Destroys the cgroup at `cgroup` with the default [`KillPolicy`].
///
/// # Errors
///
/// See [`destroy_cgroup_with`].
pub fn destroy_cgroup(cgroup: &Path) -> Result<ResourceStats> {
    destroy_cgroup_with(cgroup, &KillPolicy::default())
}

/// Destroys the cgroup at `cgroup`: kills every remaining member process
/// (descendant cgroups first), samples CPU accounting, and removes the
/// directory. A cgroup that is already gone yields an empty sample.
///
/// This is deliberately a blast-radius operation, not a graceful shutdown:
/// members get `SIGKILL`, repeatedly, until the membership list is empty.
///
/// # Errors
///
/// Returns [`CorralError::KillTimeout`] if members survive the retry
/// budget, or an I/O error if the directory cannot be read or removed for
/// any reason other than already being gone.
pub fn destroy_cgroup_with(cgroup: &Path, policy: &KillPolicy) -> Result<ResourceStats> {
    if !cgroup.exists() {
        return Ok(ResourceStats::default());
    }
    let collected = destroy_tree(cgroup, policy, true)?;
    tracing::info!(cgroup = %cgroup.display(), "cgroup destroyed");
    Ok(collected)
}

/// Removes one cgroup and its descendants, collecting stats only at the
/// requested level; samples from deeper nodes roll up into the parent's
/// counters anyway.
fn destroy_tree(cgroup: &Path, policy: &KillPolicy, collect_stats: bool) -> Result<ResourceStats> {
    if !cgroup.exists() {
        return Ok(ResourceStats::default());
    }

    // rmdir refuses while child cgroups exist
    let entries = fs::read_dir(cgroup).map_err(|e| CorralError::Io {
        path: cgroup.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| CorralError::Io {
            path: cgroup.to_path_buf(),
            source: e,
        })?;
        let file_type = entry.file_type().map_err(|e| CorralError::Io {
            path: entry.path(),
            source: e,
        })?;
        if file_type.is_dir() {
            let _ = destroy_tree(&entry.path(), policy, false)?;
        }
    }

    kill_members(cgroup, policy)?;

    let collected = if collect_stats {
        stats::read_stats(cgroup)
    } else {
        ResourceStats::default()
    };

    match fs::remove_dir(cgroup) {
        Ok(()) => Ok(collected),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(collected),
        Err(e) => Err(CorralError::Io {
            path: cgroup.to_path_buf(),
            source: e,
        }),
    }
}

/// Kills member processes until `cgroup.procs` reads empty, within the
/// policy's retry budget.
fn kill_members(cgroup: &Path, policy: &KillPolicy) -> Result<()> {
    let procs_file = cgroup.join("cgroup.procs");
    let attempts = policy.effective_attempts();

    for attempt in 1..=attempts {
        let pids = read_member_pids(&procs_file)?;
        if pids.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            cgroup = %cgroup.display(),
            attempt,
            members = pids.len(),
            "killing cgroup members"
        );
        if !write_kill_switch(cgroup) {
            for pid in pids {
                kill_member(pid);
            }
        }
        std::thread::sleep(policy.backoff);
    }

    if read_member_pids(&procs_file)?.is_empty() {
        return Ok(());
    }
    Err(CorralError::KillTimeout {
        cgroup: cgroup.to_path_buf(),
        attempts,
    })
}

/// Writes `1` to `cgroup.kill`, which takes down the entire subtree in one
/// operation on kernels that have it (5.14+). Returns `false` when the file
/// is absent and members must be signalled individually.
fn write_kill_switch(cgroup: &Path) -> bool {
    let kill_file = cgroup.join("cgroup.kill");
    kill_file.exists() && fs::write(&kill_file, "1").is_ok()
}

fn kill_member(pid: i32) {
    match kill(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) => tracing::debug!(pid, "killed cgroup member"),
        // already reaped between the read and the signal
        Err(Errno::ESRCH) => {}
        Err(err) => tracing::debug!(pid, %err, "failed to signal cgroup member"),
    }
}

/// Reads the membership list. A missing `cgroup.procs` reads as empty:
/// the cgroup is either already unlinked or not a live kernel node.
fn read_member_pids(procs_file: &Path) -> Result<Vec<i32>> {
    let contents = match fs::read_to_string(procs_file) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CorralError::Io {
                path: procs_file.to_path_buf(),
                source: e,
            });
        }
    };
    Ok(contents
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect())
}
