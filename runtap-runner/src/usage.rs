// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CPU time accounting for child processes.

use std::time::Duration;

/// CPU time consumed by all waited-for children of this process.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ChildUsage {
    pub(crate) user: Duration,
    pub(crate) system: Duration,
}

impl ChildUsage {
    pub(crate) fn total(&self) -> Duration {
        self.user + self.system
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        pub(crate) fn children_usage() -> ChildUsage {
            let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
            let ret = unsafe { libc::getrusage(libc::RUSAGE_CHILDREN, &mut usage) };
            if ret != 0 {
                return ChildUsage::default();
            }
            ChildUsage {
                user: timeval_duration(&usage.ru_utime),
                system: timeval_duration(&usage.ru_stime),
            }
        }

        fn timeval_duration(tv: &libc::timeval) -> Duration {
            let secs = u64::try_from(tv.tv_sec).unwrap_or(0);
            let micros = u64::try_from(tv.tv_usec).unwrap_or(0);
            Duration::from_secs(secs) + Duration::from_micros(micros)
        }
    } else {
        pub(crate) fn children_usage() -> ChildUsage {
            ChildUsage::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_total_sums_components() {
        let usage = ChildUsage {
            user: Duration::from_millis(300),
            system: Duration::from_millis(200),
        };
        assert_eq!(usage.total(), Duration::from_millis(500));
    }

    #[test]
    fn children_usage_is_well_formed() {
        // No children have run in this test, but the call must succeed and
        // return something additive.
        let usage = children_usage();
        assert!(usage.total() >= usage.user);
    }
}
