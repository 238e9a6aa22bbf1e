//! CPU accounting extraction from cgroup stat files.

use std::fs;
use std::path::Path;
use std::time::Duration;

use corral_common::types::ResourceStats;

/// Samples CPU accounting for the given cgroup.
///
/// Reads `cpu.stat` under the cgroup directory. A missing file (controller
/// not enabled, or the cgroup already gone) or a missing key yields `None`
/// for the corresponding field rather than an error. Note the whole sample
/// is lost once the cgroup is removed, so destruction reads it first.
#[must_use]
pub fn read_stats(cgroup: &Path) -> ResourceStats {
    let contents = fs::read_to_string(cgroup.join("cpu.stat")).unwrap_or_default();
    parse_cpu_stat(&contents)
}

/// Parses `cpu.stat` key/value lines, keeping the fields we account for.
fn parse_cpu_stat(contents: &str) -> ResourceStats {
    let mut stats = ResourceStats::default();
    for line in contents.lines() {
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Ok(micros) = value.parse::<u64>() else {
            continue;
        };
        match key {
            "user_usec" => stats.cpu_user = Some(Duration::from_micros(micros)),
            "system_usec" => stats.cpu_system = Some(Duration::from_micros(micros)),
            _ => {}
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_and_system_times() {
        let stats = parse_cpu_stat("usage_usec 5000\nuser_usec 3000\nsystem_usec 2000\n");
        assert_eq!(stats.cpu_user, Some(Duration::from_micros(3000)));
        assert_eq!(stats.cpu_system, Some(Duration::from_micros(2000)));
    }

    #[test]
    fn missing_keys_surface_as_unavailable_not_zero() {
        let stats = parse_cpu_stat("usage_usec 5000\n");
        assert_eq!(stats.cpu_user, None);
        assert_eq!(stats.cpu_system, None);
    }

    #[test]
    fn garbage_lines_are_ignored() {
        let stats = parse_cpu_stat("user_usec not-a-number\nsystem_usec 70\nnoise\n");
        assert_eq!(stats.cpu_user, None);
        assert_eq!(stats.cpu_system, Some(Duration::from_micros(70)));
    }

    #[test]
    fn missing_stat_file_yields_empty_sample() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stats = read_stats(dir.path());
        assert!(stats.is_empty());
    }

    #[test]
    fn reads_stat_file_from_cgroup_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("cpu.stat"), "user_usec 1234\nsystem_usec 567\n")
            .expect("write cpu.stat");

        let stats = read_stats(dir.path());
        assert_eq!(stats.cpu_user, Some(Duration::from_micros(1234)));
        assert_eq!(stats.cpu_system, Some(Duration::from_micros(567)));
    }
}
