// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock timing for a suite run.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Obtain a new instance of the stopwatch.
pub(crate) fn stopwatch() -> StopwatchStart {
    StopwatchStart::new()
}

/// The start of a stopwatch.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StopwatchStart {
    start_time: DateTime<Local>,
    instant: Instant,
}

impl StopwatchStart {
    fn new() -> Self {
        Self {
            start_time: Local::now(),
            instant: Instant::now(),
        }
    }

    pub(crate) fn start_time(&self) -> &DateTime<Local> {
        &self.start_time
    }

    pub(crate) fn snapshot(&self) -> StopwatchSnapshot {
        StopwatchSnapshot {
            duration: self.instant.elapsed(),
        }
    }
}

/// A snapshot of the state of the stopwatch.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StopwatchSnapshot {
    /// The duration since the start of the run.
    pub(crate) duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_monotonic() {
        let start = stopwatch();
        let first = start.snapshot();
        let second = start.snapshot();
        assert!(second.duration >= first.duration);
    }
}
