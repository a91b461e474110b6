// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test-program state: the test set.
//!
//! A [`TestSet`] records everything learned from one execution of one test
//! program: the plan, the outcome table indexed by test number, counters,
//! and the decoded exit status. It is mutated by the protocol parser while
//! lines arrive and consumed by the reporter afterwards.

use crate::test_command::ExitDisposition;
use camino::Utf8PathBuf;

/// The outcome recorded for a single test number.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TestStatus {
    /// The test reported failure (`not ok`).
    Fail,
    /// The test reported success (`ok`).
    Pass,
    /// The test was skipped, or was an expected failure (`# todo`).
    Skip,
    /// No result has been reported for this slot.
    Invalid,
}

/// The state of the test set's plan declaration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanStatus {
    /// Nothing seen yet.
    Unset,
    /// Plan seen before any results; the count is fixed.
    PlanFirst,
    /// Results seen with no plan yet; the count is still provisional.
    PlanPending,
    /// Plan seen after some results; the count is now frozen.
    PlanFinal,
}

/// Smallest results-table allocation when growing from empty.
const MIN_RESULTS_CAPACITY: usize = 32;

/// The aggregate record of one test program's single execution.
#[derive(Debug)]
pub struct TestSet {
    /// The declared name of the test.
    pub(crate) name: String,
    /// The resolved path to the test program.
    pub(crate) path: Utf8PathBuf,
    /// The status of the plan.
    pub(crate) plan: PlanStatus,
    /// Expected count of tests.
    pub(crate) count: usize,
    /// The last seen test number.
    pub(crate) current: usize,
    /// Width of the last inline progress indicator, for backspacing.
    pub(crate) progress_len: usize,
    /// Count of passing tests.
    pub(crate) passed: u64,
    /// Count of failing tests.
    pub(crate) failed: u64,
    /// Count of skipped tests.
    pub(crate) skipped: u64,
    /// Table of results by test number (1-based number, 0-based slot).
    pub(crate) results: Vec<TestStatus>,
    /// Whether the set was aborted.
    pub(crate) aborted: bool,
    /// Whether a diagnostic has already been printed for this set.
    pub(crate) reported: bool,
    /// Decoded exit status of the test program.
    pub(crate) exit: Option<ExitDisposition>,
    /// Whether the whole file was skipped via `1..0 # skip`.
    pub(crate) all_skipped: bool,
    /// The reason the whole file was skipped.
    pub(crate) skip_reason: Option<String>,
    /// TAP version in effect; `None` until established.
    pub(crate) tap_version: Option<i64>,
}

impl TestSet {
    /// Creates an empty test set for the named test program.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Utf8PathBuf::new(),
            plan: PlanStatus::Unset,
            count: 0,
            current: 0,
            progress_len: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            results: Vec::new(),
            aborted: false,
            reported: false,
            exit: None,
            all_skipped: false,
            skip_reason: None,
            tap_version: None,
        }
    }

    /// The declared name of the test program.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Count of passing tests.
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// Count of failing tests.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Count of skipped tests.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Whether the set was aborted before it could be judged.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// The outcome recorded for a 1-based test number, if the slot exists.
    pub fn result(&self, number: usize) -> Option<TestStatus> {
        self.results.get(number.checked_sub(1)?).copied()
    }

    /// Grows the results table so that test number `needed` has a slot.
    ///
    /// Growth doubles the current capacity, with a floor of 32 slots, and at
    /// least enough to hold `needed`. New slots start out `Invalid`.
    pub(crate) fn grow_results(&mut self, needed: usize) {
        if needed <= self.results.len() {
            return;
        }
        let mut n = if self.results.is_empty() {
            MIN_RESULTS_CAPACITY
        } else {
            self.results.len() * 2
        };
        if n < needed {
            n = needed;
        }
        self.results.resize(n, TestStatus::Invalid);
    }

    /// Grows the results table to exactly `count` slots, used when a plan
    /// line fixes the count.
    pub(crate) fn grow_results_exact(&mut self, count: usize) {
        if count > self.results.len() {
            self.results.resize(count, TestStatus::Invalid);
        }
    }

    /// Records an outcome for a 1-based test number and bumps the matching
    /// counter. The slot must exist and hold `Invalid`.
    pub(crate) fn record(&mut self, number: usize, status: TestStatus) {
        debug_assert_eq!(self.results[number - 1], TestStatus::Invalid);
        match status {
            TestStatus::Pass => self.passed += 1,
            TestStatus::Fail => self.failed += 1,
            TestStatus::Skip => self.skipped += 1,
            TestStatus::Invalid => {}
        }
        self.current = number;
        self.results[number - 1] = status;
    }

    /// Converts every slot never reported on into a failure.
    ///
    /// Run after the summary so the live classification reflects what the
    /// stream actually said, while the suite totals count missing results
    /// as failures.
    pub(crate) fn fail_missing(&mut self) -> bool {
        let mut any = false;
        for slot in self.results.iter_mut().take(self.count) {
            if *slot == TestStatus::Invalid {
                *slot = TestStatus::Fail;
                self.failed += 1;
                any = true;
            }
        }
        any
    }
}
