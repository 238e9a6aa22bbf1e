//! End-to-end lifecycle tests for the containment guards.
//!
//! Most scenarios run against synthetic cgroup trees (plain directories
//! carrying `cgroup.procs` / `cpu.stat` files) so they need no privileges.
//! The one test that exercises a real kernel cgroup (create, populate with
//! a live worker, destroy, verify the worker is gone) requires root plus
//! cgroup2 write delegation and is `#[ignore]`d accordingly.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use corral_common::config::KillPolicy;
use corral_core::cgroup::{CgroupGuard, destroy_cgroup, hierarchy};
use corral_core::guard::ContainerGuard;
use corral_core::jail::JailGuard;

fn fake_cgroup(dir: &Path, name: &str, user_usec: u64, system_usec: u64) -> PathBuf {
    let path = dir.join(name);
    fs::create_dir_all(&path).expect("create fake cgroup");
    fs::write(path.join("cgroup.procs"), "").expect("write procs");
    fs::write(
        path.join("cpu.stat"),
        format!("usage_usec {}\nuser_usec {user_usec}\nsystem_usec {system_usec}\n",
            user_usec + system_usec),
    )
    .expect("write cpu.stat");
    path
}

// ── Guard lifecycle over a synthetic tree ────────────────────────────

#[test]
fn lifecycle_destroy_reports_final_stats_and_removes_tree() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = fake_cgroup(dir.path(), "sandbox", 8_000, 2_000);
    let _worker = fake_cgroup(&sandbox, "worker", 5_000, 1_000);

    let mut guard = CgroupGuard::new(&sandbox);
    let stats = guard.destroy().expect("destroy");

    assert_eq!(stats.cpu_user, Some(Duration::from_micros(8_000)));
    assert_eq!(stats.cpu_system, Some(Duration::from_micros(2_000)));
    assert!(!sandbox.exists());

    // re-querying the destroyed container finds nothing, and a repeat
    // destroy stays a no-op
    let again = destroy_cgroup(&sandbox).expect("repeat destroy");
    assert!(again.is_empty());
}

#[test]
fn lifecycle_scope_exit_cleans_up_unless_disarmed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dropped = fake_cgroup(dir.path(), "dropped", 1, 1);
    let kept = fake_cgroup(dir.path(), "kept", 1, 1);

    {
        let _cleaned = CgroupGuard::new(&dropped);
        let mut survivor = CgroupGuard::new(&kept);
        survivor.disarm();
    }

    assert!(!dropped.exists());
    assert!(kept.exists());
}

#[test]
fn lifecycle_error_propagates_from_explicit_destroy_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stuck = fake_cgroup(dir.path(), "stuck", 1, 1);
    // membership that never empties: a pid above the kernel's pid ceiling
    fs::write(stuck.join("cgroup.procs"), "4194304\n").expect("write procs");

    let policy = KillPolicy {
        max_attempts: 2,
        backoff: Duration::from_millis(1),
    };
    let mut guard = CgroupGuard::with_policy(&stuck, policy);
    assert!(guard.destroy().is_err());

    // the implicit path suppresses the same failure
    drop(guard);
    assert!(stuck.exists());
}

// ── The trait seam ───────────────────────────────────────────────────

fn teardown<G: ContainerGuard>(mut guard: G) -> G::Stats {
    guard.destroy().expect("teardown")
}

#[test]
fn guards_are_interchangeable_behind_the_trait() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cgroup = fake_cgroup(dir.path(), "traited", 10, 20);

    let stats = teardown(CgroupGuard::new(&cgroup));
    assert_eq!(stats.cpu_user, Some(Duration::from_micros(10)));
    assert!(!cgroup.exists());

    // a disarmed jail guard destroys to the unit sample on any platform
    let mut jail = JailGuard::default();
    jail.disarm();
    teardown(jail);
}

// ── Hierarchy discovery against the live kernel ──────────────────────

#[cfg(target_os = "linux")]
#[test]
fn current_cgroup_is_rereadable_and_consistent() {
    let first = hierarchy::current_cgroup().expect("current cgroup");
    let second = hierarchy::current_cgroup().expect("current cgroup again");
    assert_eq!(first, second);
    assert!(first.is_absolute());
}

#[cfg(target_os = "linux")]
#[test]
fn root_cgroup_is_frozen_for_the_process() {
    let first = hierarchy::root_cgroup().expect("root cgroup");
    let second = hierarchy::root_cgroup().expect("root cgroup again");
    assert_eq!(first, second);
}

#[cfg(target_os = "linux")]
#[test]
fn cgroup_fs_mount_points_at_a_real_directory() {
    // None is legitimate on hosts without a cgroup2 mount
    if let Some(mount) = hierarchy::cgroup_fs_mount() {
        assert!(mount.is_dir());
    }
}

// ── Privileged end-to-end scenario ───────────────────────────────────

#[cfg(target_os = "linux")]
#[test]
#[ignore = "requires root and cgroup2 write delegation"]
fn destroying_a_live_cgroup_kills_its_worker() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("corral_core=debug")
        .try_init();

    let mount = hierarchy::cgroup_fs_mount().expect("cgroup2 mount");
    let root = hierarchy::root_cgroup().expect("root cgroup");
    let parent = mount.join(root.strip_prefix("/").expect("rooted path"));

    let cgroup = parent.join("corral-e2e");
    fs::create_dir(&cgroup).expect("create sub-cgroup");
    let mut guard = CgroupGuard::new(&cgroup);

    let mut worker = std::process::Command::new("sleep")
        .arg("60")
        .spawn()
        .expect("spawn worker");
    fs::write(cgroup.join("cgroup.procs"), worker.id().to_string()).expect("move worker in");

    let before = corral_core::cgroup::stats::read_stats(&cgroup);
    let stats = guard.destroy().expect("destroy live cgroup");

    // the worker died with the cgroup; wait() reaps a signal exit
    let status = worker.wait().expect("reap worker");
    assert!(!status.success());
    assert!(!cgroup.exists());

    // accounting never runs backwards between the two samples
    if let (Some(earlier), Some(last)) = (before.cpu_user, stats.cpu_user) {
        assert!(last >= earlier);
    }
}
