//! Cgroup hierarchy discovery.
//!
//! Locates the cgroups v2 mount point, reads the calling process's own
//! membership record, and fixes the process-wide root under which new
//! sub-cgroups are created.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use corral_common::constants::{PROC_SELF_CGROUP, PROC_SELF_MOUNTINFO};
use corral_common::error::{CorralError, Result};

/// Returns the mount point of the cgroups v2 unified hierarchy.
///
/// Returns `None` when no `cgroup2` filesystem is mounted; callers should
/// treat that as "containment unavailable on this system", not as an error.
#[must_use]
pub fn cgroup_fs_mount() -> Option<PathBuf> {
    let table = fs::read_to_string(PROC_SELF_MOUNTINFO).ok()?;
    cgroup2_mount_point(&table)
}

/// Finds the first `cgroup2` entry in a `mountinfo`-format mount table.
fn cgroup2_mount_point(table: &str) -> Option<PathBuf> {
    for line in table.lines() {
        // mountinfo: "<ids...> <mount point> <options...> - <fstype> <source> <super options>"
        let Some((mount_fields, fs_fields)) = line.split_once(" - ") else {
            continue;
        };
        if fs_fields.split_whitespace().next() != Some("cgroup2") {
            continue;
        }
        if let Some(mount_point) = mount_fields.split_whitespace().nth(4) {
            return Some(PathBuf::from(mount_point));
        }
    }
    None
}

/// Reads a `/proc/<pid>/cgroup`-format file into a map from controller
/// name to cgroup path.
///
/// Hybrid-hierarchy records list one line per v1 controller group plus the
/// v2 line whose controller field is empty; the v2 entry is keyed by `""`.
/// A `name=` prefix on named v1 hierarchies is stripped. Lines that do not
/// match the `<id>:<controllers>:<path>` shape are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn memberships(cgroup_file: &Path) -> Result<HashMap<String, String>> {
    let contents = fs::read_to_string(cgroup_file).map_err(|e| CorralError::Io {
        path: cgroup_file.to_path_buf(),
        source: e,
    })?;
    Ok(parse_memberships(&contents))
}

fn parse_memberships(contents: &str) -> HashMap<String, String> {
    let mut cgroups = HashMap::new();
    for line in contents.lines() {
        let mut fields = line.splitn(3, ':');
        let (Some(id), Some(controllers), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let name = controllers.strip_prefix("name=").unwrap_or(controllers);
        let _ = cgroups.insert(name.to_owned(), path.to_owned());
    }
    cgroups
}

/// Returns the cgroup the calling process currently belongs to, relative to
/// the cgroups v2 mount point.
///
/// This is a pure query and re-reads the membership record every time,
/// since membership legitimately changes when the process is moved into
/// another cgroup. Use [`root_cgroup`] for a value that stays put.
///
/// # Errors
///
/// Returns an error if the membership record cannot be read or contains no
/// unified-hierarchy entry.
pub fn current_cgroup() -> Result<PathBuf> {
    current_cgroup_from(Path::new(PROC_SELF_CGROUP))
}

fn current_cgroup_from(cgroup_file: &Path) -> Result<PathBuf> {
    memberships(cgroup_file)?
        .remove("")
        .map(PathBuf::from)
        .ok_or(CorralError::Unsupported {
            feature: "cgroups v2 unified hierarchy",
        })
}

/// First-call-wins cache for the cgroup new sub-cgroups nest under.
///
/// The process-wide instance behind [`root_cgroup`] covers normal use;
/// holding a separate `RootCgroup` gives a caller (or a test) its own
/// independently-frozen value.
#[derive(Debug, Default)]
pub struct RootCgroup {
    cached: OnceLock<PathBuf>,
}

impl RootCgroup {
    /// Creates an unresolved cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cached: OnceLock::new(),
        }
    }

    /// Resolves the root, probing for the current cgroup only on first use.
    ///
    /// Every later call returns the first resolved value, no matter what
    /// `probe` would report by then. Concurrent first calls race the probe
    /// but agree on a single winning value.
    ///
    /// # Errors
    ///
    /// Propagates the probe's error while the cache is still unresolved.
    pub fn resolve_with<F>(&self, probe: F) -> Result<PathBuf>
    where
        F: FnOnce() -> Result<PathBuf>,
    {
        if let Some(cached) = self.cached.get() {
            return Ok(cached.clone());
        }
        let current = probe()?;
        Ok(self.cached.get_or_init(|| current).clone())
    }
}

static ROOT_CGROUP: RootCgroup = RootCgroup::new();

/// Returns the cgroup to use as the parent for all newly created
/// sub-cgroups.
///
/// The first call captures [`current_cgroup`] and freezes it for the rest
/// of the process's life. Later membership changes, including the process
/// moving itself into a sandbox it created, do not change what this
/// returns, so nested creations keep hanging off one stable ancestor.
///
/// # Errors
///
/// Returns an error if the first resolution fails; a failed first call
/// leaves the cache unresolved for the next caller.
pub fn root_cgroup() -> Result<PathBuf> {
    ROOT_CGROUP.resolve_with(current_cgroup)
}
