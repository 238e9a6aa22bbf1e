//! # corral-core
//!
//! Lifecycle primitives for OS-level process containment.
//!
//! A *container* here is a kernel resource-isolation boundary (a cgroup v2
//! directory on Linux, a jail on FreeBSD) that bounds resource usage and
//! gives the owner a single kill switch for the whole process tree inside.
//! This crate provides:
//!
//! - **Guards**: owning wrappers ([`cgroup::CgroupGuard`],
//!   [`jail::JailGuard`]) that destroy their container exactly once, on
//!   every exit path, unless deliberately disarmed.
//! - **Hierarchy discovery**: locating the cgroup2 mount and the calling
//!   process's own cgroup, plus the process-wide root under which new
//!   sub-cgroups should be created.
//! - **Accounting**: CPU-time statistics sampled from a container just
//!   before it is destroyed.
//!
//! Creating containers (and everything else about sandbox construction) is
//! the caller's business; this crate takes over once an identifier exists.
//!
//! All unsafe system calls are encapsulated in safe wrappers with proper
//! error handling and `// SAFETY:` documentation.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
pub mod guard;
pub mod jail;
