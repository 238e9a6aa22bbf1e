//! Well-known paths and default tuning values.

/// Conventional mount point of the cgroups v2 unified hierarchy.
///
/// Discovery goes through the mount table rather than this path; it is the
/// fallback used in documentation and tests only.
pub const CGROUP_FS_MOUNT: &str = "/sys/fs/cgroup";

/// Membership record of the calling process.
pub const PROC_SELF_CGROUP: &str = "/proc/self/cgroup";

/// Mount table of the calling process, in `mountinfo` format.
pub const PROC_SELF_MOUNTINFO: &str = "/proc/self/mountinfo";

/// Default number of kill/poll rounds before destruction gives up.
pub const DEFAULT_KILL_ATTEMPTS: u32 = 50;

/// Default pause between kill/poll rounds, in milliseconds.
pub const DEFAULT_KILL_BACKOFF_MS: u64 = 20;
