// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning finished test sets into human-readable reports.
//!
//! A finished set is classified in a fixed priority order: already
//! reported, all-skipped, reserved orchestration exit code, non-zero exit,
//! signal, no valid plan, then the regular summary. Failing and missing
//! test numbers render as compressed ranges; the multi-test failure table
//! additionally truncates the range list with `...` under a column budget,
//! checked before each new token rather than retroactively.

use crate::helpers::plural;
use crate::runner::RunStats;
use crate::test_command::{
    ExitDisposition, CHILDERR_DUP, CHILDERR_EXEC, CHILDERR_STDERR,
};
use crate::test_set::{PlanStatus, TestSet, TestStatus};
use crate::usage::ChildUsage;
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};
use std::time::Duration;

/// Column budget for the failing-test ranges in the failure table.
const FAIL_TABLE_RANGE_BUDGET: usize = 19;

const FAIL_HEADER: &str = "\nFailed Set                 Fail/Total (%) Skip Stat  Failing Tests\n-------------------------- -------------- ---- ----  ------------------------";

/// Styles for report output, plain unless colorized.
#[derive(Clone, Debug, Default)]
pub(crate) struct Styles {
    pub(crate) ok: Style,
    pub(crate) fail: Style,
    pub(crate) skip: Style,
}

impl Styles {
    pub(crate) fn colorize(&mut self) {
        self.ok = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
    }
}

/// How the test program ended, as far as the summary is concerned.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ExitNote {
    Clean,
    Exit(i32),
    Signal { signal: i32, core_dumped: bool },
}

/// Erases the inline progress indicator, if one is on screen.
pub(crate) fn erase_progress(out: &mut dyn Write, ts: &mut TestSet) -> io::Result<()> {
    if ts.progress_len == 0 {
        return Ok(());
    }
    for _ in 0..ts.progress_len {
        write!(out, "\u{8}")?;
    }
    for _ in 0..ts.progress_len {
        write!(out, " ")?;
    }
    for _ in 0..ts.progress_len {
        write!(out, "\u{8}")?;
    }
    ts.progress_len = 0;
    out.flush()
}

/// Classifies a finished test set and prints its one-line report. Returns
/// true iff the set ran successfully and every test passed or was skipped.
pub(crate) fn analyze(
    out: &mut dyn Write,
    styles: &Styles,
    ts: &mut TestSet,
) -> io::Result<bool> {
    if ts.reported {
        return Ok(false);
    }
    if ts.all_skipped {
        match &ts.skip_reason {
            None => writeln!(out, "{}", "skipped".style(styles.skip))?,
            Some(reason) => writeln!(out, "{} ({reason})", "skipped".style(styles.skip))?,
        }
        return Ok(true);
    }
    match ts.exit.unwrap_or(ExitDisposition::Exited(0)) {
        ExitDisposition::Exited(code) if code != 0 => {
            match code {
                CHILDERR_DUP => {
                    writeln!(out, "{} (can't dup file descriptors)", "ABORTED".style(styles.fail))?;
                }
                CHILDERR_EXEC => {
                    writeln!(out, "{} (execution failed -- not found?)", "ABORTED".style(styles.fail))?;
                }
                CHILDERR_STDERR => {
                    writeln!(out, "{} (can't open /dev/null)", "ABORTED".style(styles.fail))?;
                }
                _ => summarize(out, styles, ts, ExitNote::Exit(code))?,
            }
            Ok(false)
        }
        ExitDisposition::Signaled {
            signal,
            core_dumped,
        } => {
            summarize(
                out,
                styles,
                ts,
                ExitNote::Signal {
                    signal,
                    core_dumped,
                },
            )?;
            Ok(false)
        }
        ExitDisposition::Exited(_) => {
            if !matches!(ts.plan, PlanStatus::PlanFirst | PlanStatus::PlanFinal) {
                writeln!(out, "{} (no valid test plan)", "ABORTED".style(styles.fail))?;
                ts.aborted = true;
                Ok(false)
            } else {
                summarize(out, styles, ts, ExitNote::Clean)?;
                Ok(ts.failed == 0)
            }
        }
    }
}

/// Prints the one-line summary for a judged test set: missing ranges,
/// failing ranges, or an ok/dubious verdict, plus any exit/signal suffix.
pub(crate) fn summarize(
    out: &mut dyn Write,
    styles: &Styles,
    ts: &TestSet,
    note: ExitNote,
) -> io::Result<()> {
    if ts.aborted {
        write!(out, "{}", "ABORTED".style(styles.fail))?;
        if ts.count > 0 {
            let total = (ts.count as u64).saturating_sub(ts.skipped);
            write!(out, " (passed {}/{total})", ts.passed)?;
        }
    } else {
        let missing = collect_ranges(ts, TestStatus::Invalid);
        let failed = collect_ranges(ts, TestStatus::Fail);
        if !missing.is_empty() {
            write!(out, "{} ", "MISSED".style(styles.fail))?;
            for (k, (first, last)) in missing.iter().enumerate() {
                print_range(out, *first, *last, k, 0)?;
            }
        }
        if !failed.is_empty() {
            if !missing.is_empty() {
                write!(out, "; ")?;
            }
            write!(out, "{} ", "FAILED".style(styles.fail))?;
            for (k, (first, last)) in failed.iter().enumerate() {
                print_range(out, *first, *last, k, 0)?;
            }
        }
        if missing.is_empty() && failed.is_empty() {
            match note {
                ExitNote::Clean => write!(out, "{}", "ok".style(styles.ok))?,
                _ => write!(out, "{}", "dubious".style(styles.fail))?,
            }
            if ts.skipped > 0 {
                write!(
                    out,
                    " (skipped {} {})",
                    ts.skipped,
                    plural::tests_str(ts.skipped)
                )?;
            }
        }
    }
    match note {
        ExitNote::Clean => {}
        ExitNote::Exit(code) => write!(out, " (exit status {code})")?,
        ExitNote::Signal {
            signal,
            core_dumped,
        } => {
            let core = if core_dumped { ", core dumped" } else { "" };
            write!(out, " (killed by signal {signal}{core})")?;
        }
    }
    writeln!(out)
}

/// Prints the tabular per-file breakdown for test sets that did not
/// succeed.
pub(crate) fn fail_summary(
    out: &mut dyn Write,
    styles: &Styles,
    fails: &[TestSet],
) -> io::Result<()> {
    writeln!(out, "{}", FAIL_HEADER.style(styles.fail))?;
    for ts in fails {
        let name: String = ts.name.chars().take(26).collect();
        let total = (ts.count as u64).saturating_sub(ts.skipped);
        let pct = if total > 0 {
            ts.failed as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        write!(
            out,
            "{name:<26} {:>4}/{total:<4} {pct:>3.0}% {:>4} ",
            ts.failed, ts.skipped
        )?;
        match ts.exit.and_then(|exit| exit.exit_code()) {
            Some(code) => write!(out, "{code:>4}  ")?,
            None => write!(out, "  --  ")?,
        }
        if ts.aborted {
            writeln!(out, "aborted")?;
            continue;
        }
        let mut chars = 0;
        for (first, last) in collect_ranges(ts, TestStatus::Fail) {
            chars += print_range(out, first, last, chars, FAIL_TABLE_RANGE_BUDGET)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Prints the closing suite totals.
pub(crate) fn suite_summary(
    out: &mut dyn Write,
    styles: &Styles,
    stats: &RunStats,
    wall: Duration,
    usage: &ChildUsage,
) -> io::Result<()> {
    writeln!(out)?;
    if stats.aborted != 0 {
        write!(
            out,
            "Aborted {} {}, passed {}/{} tests",
            stats.aborted,
            plural::test_sets_str(stats.aborted),
            stats.passed,
            stats.total
        )?;
    } else if stats.failed == 0 {
        write!(out, "{}", "All tests successful".style(styles.ok))?;
    } else {
        let pct = (stats.total - stats.failed) as f64 * 100.0 / stats.total as f64;
        write!(
            out,
            "Failed {}/{} tests, {pct:.2}% okay",
            stats.failed, stats.total
        )?;
    }
    if stats.skipped != 0 {
        write!(
            out,
            ", {} {} skipped",
            stats.skipped,
            plural::tests_str(stats.skipped)
        )?;
    }
    writeln!(out, ".")?;
    writeln!(
        out,
        "Files={},  Tests={},  {:.2} seconds ({:.2} usr + {:.2} sys = {:.2} CPU)",
        stats.files,
        stats.total,
        wall.as_secs_f64(),
        usage.user.as_secs_f64(),
        usage.system.as_secs_f64(),
        usage.total().as_secs_f64()
    )
}

/// Collects 1-based inclusive ranges of consecutive test numbers whose
/// slot holds `status`, over the declared count.
fn collect_ranges(ts: &TestSet, status: TestStatus) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (i, slot) in ts.results.iter().take(ts.count).enumerate() {
        if *slot != status {
            continue;
        }
        let number = i + 1;
        match ranges.last_mut() {
            Some((_, last)) if *last + 1 == number => *last = number,
            _ => ranges.push((number, number)),
        }
    }
    ranges
}

/// Prints one range of test numbers, returning the number of characters it
/// took up. `chars` is how much of the line is already used; under a
/// non-zero `limit`, a range that would not fit prints `...` once instead.
fn print_range(
    out: &mut dyn Write,
    first: usize,
    last: usize,
    chars: usize,
    limit: usize,
) -> io::Result<usize> {
    let mut needed = digits(first);
    if last > first {
        needed += digits(last) + 1;
    }
    if chars > 0 {
        needed += 2;
    }
    if limit > 0 && chars + needed > limit {
        needed = 0;
        if chars <= limit {
            if chars > 0 {
                write!(out, ", ")?;
                needed += 2;
            }
            write!(out, "...")?;
            needed += 3;
        }
    } else {
        if chars > 0 {
            write!(out, ", ")?;
        }
        if last > first {
            write!(out, "{first}-")?;
        }
        write!(out, "{last}")?;
    }
    Ok(needed)
}

fn digits(mut n: usize) -> usize {
    let mut count = 0;
    while n > 0 {
        count += 1;
        n /= 10;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain() -> Styles {
        Styles::default()
    }

    fn set_with(count: usize, outcomes: &[(usize, TestStatus)]) -> TestSet {
        let mut ts = TestSet::new("demo");
        ts.plan = PlanStatus::PlanFirst;
        ts.count = count;
        ts.grow_results_exact(count);
        for (number, status) in outcomes {
            ts.record(*number, *status);
        }
        ts.exit = Some(ExitDisposition::Exited(0));
        ts
    }

    fn render_summary(ts: &TestSet, note: ExitNote) -> String {
        let mut out = Vec::new();
        summarize(&mut out, &plain(), ts, note).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn render_analyze(ts: &mut TestSet) -> (bool, String) {
        let mut out = Vec::new();
        let ok = analyze(&mut out, &plain(), ts).unwrap();
        (ok, String::from_utf8(out).unwrap())
    }

    #[test]
    fn range_compression() {
        let mut ts = set_with(10, &[]);
        for n in 1..=10 {
            let status = if [2, 3, 4, 7, 9, 10].contains(&n) {
                TestStatus::Fail
            } else {
                TestStatus::Pass
            };
            ts.record(n, status);
        }
        assert_eq!(render_summary(&ts, ExitNote::Clean), "FAILED 2-4, 7, 9-10\n");
    }

    #[test]
    fn missing_then_failed_sections() {
        let ts = set_with(
            5,
            &[
                (1, TestStatus::Pass),
                (3, TestStatus::Fail),
                (4, TestStatus::Fail),
            ],
        );
        assert_eq!(
            render_summary(&ts, ExitNote::Clean),
            "MISSED 2, 5; FAILED 3-4\n"
        );
    }

    #[test]
    fn clean_set_is_ok_with_skip_parenthetical() {
        let ts = set_with(
            3,
            &[
                (1, TestStatus::Pass),
                (2, TestStatus::Skip),
                (3, TestStatus::Pass),
            ],
        );
        assert_eq!(render_summary(&ts, ExitNote::Clean), "ok (skipped 1 test)\n");
    }

    #[test]
    fn nonzero_exit_renders_dubious() {
        let ts = set_with(1, &[(1, TestStatus::Pass)]);
        assert_eq!(
            render_summary(&ts, ExitNote::Exit(3)),
            "dubious (exit status 3)\n"
        );
    }

    #[test]
    fn signal_suffix_with_core_dump() {
        let ts = set_with(1, &[(1, TestStatus::Pass)]);
        let note = ExitNote::Signal {
            signal: 11,
            core_dumped: true,
        };
        assert_eq!(
            render_summary(&ts, note),
            "ok (killed by signal 11, core dumped)\n"
        );
    }

    #[test]
    fn aborted_set_shows_progress_so_far() {
        let mut ts = set_with(4, &[(1, TestStatus::Pass), (2, TestStatus::Skip)]);
        ts.aborted = true;
        assert_eq!(render_summary(&ts, ExitNote::Clean), "ABORTED (passed 1/3)\n");
    }

    #[test]
    fn analyze_priority_reported_first() {
        let mut ts = set_with(1, &[(1, TestStatus::Pass)]);
        ts.reported = true;
        let (ok, out) = render_analyze(&mut ts);
        assert!(!ok);
        assert_eq!(out, "");
    }

    #[test]
    fn analyze_all_skipped_wins_over_exit_status() {
        let mut ts = TestSet::new("demo");
        ts.all_skipped = true;
        ts.skip_reason = Some("no network".to_owned());
        ts.exit = Some(ExitDisposition::Exited(2));
        let (ok, out) = render_analyze(&mut ts);
        assert!(ok);
        assert_eq!(out, "skipped (no network)\n");
    }

    #[test]
    fn analyze_reserved_exit_codes() {
        for (code, message) in [
            (CHILDERR_DUP, "ABORTED (can't dup file descriptors)\n"),
            (CHILDERR_EXEC, "ABORTED (execution failed -- not found?)\n"),
            (CHILDERR_STDERR, "ABORTED (can't open /dev/null)\n"),
        ] {
            let mut ts = set_with(1, &[(1, TestStatus::Pass)]);
            ts.exit = Some(ExitDisposition::Exited(code));
            let (ok, out) = render_analyze(&mut ts);
            assert!(!ok);
            assert_eq!(out, message);
        }
    }

    #[test]
    fn analyze_no_plan_is_aborted() {
        let mut ts = TestSet::new("demo");
        ts.exit = Some(ExitDisposition::Exited(0));
        let (ok, out) = render_analyze(&mut ts);
        assert!(!ok);
        assert!(ts.aborted);
        assert_eq!(out, "ABORTED (no valid test plan)\n");
    }

    #[test]
    fn analyze_clean_run_succeeds_iff_no_failures() {
        let mut ts = set_with(2, &[(1, TestStatus::Pass), (2, TestStatus::Pass)]);
        let (ok, out) = render_analyze(&mut ts);
        assert!(ok);
        assert_eq!(out, "ok\n");

        let mut ts = set_with(2, &[(1, TestStatus::Pass), (2, TestStatus::Fail)]);
        let (ok, out) = render_analyze(&mut ts);
        assert!(!ok);
        assert_eq!(out, "FAILED 2\n");
    }

    #[test]
    fn print_range_accounting() {
        let mut out = Vec::new();
        assert_eq!(print_range(&mut out, 2, 4, 0, 0).unwrap(), 3);
        assert_eq!(print_range(&mut out, 7, 7, 1, 0).unwrap(), 3);
        assert_eq!(print_range(&mut out, 9, 10, 2, 0).unwrap(), 6);
        assert_eq!(String::from_utf8(out).unwrap(), "2-4, 7, 9-10");
    }

    #[test]
    fn print_range_truncates_under_budget() {
        let mut out = Vec::new();
        // 18 columns used, 19 allowed: the next range cannot fit, so an
        // ellipsis is printed once.
        assert_eq!(print_range(&mut out, 15, 15, 18, 19).unwrap(), 5);
        assert_eq!(String::from_utf8(out).unwrap(), ", ...");

        // Far past the budget nothing more is printed.
        let mut out = Vec::new();
        assert_eq!(print_range(&mut out, 30, 31, 25, 19).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "");
    }

    #[test]
    fn fail_table_layout() {
        let mut ts = set_with(
            4,
            &[
                (1, TestStatus::Pass),
                (2, TestStatus::Fail),
                (3, TestStatus::Fail),
            ],
        );
        ts.fail_missing();
        ts.exit = Some(ExitDisposition::Exited(1));
        let mut out = Vec::new();
        fail_summary(&mut out, &plain(), &[ts]).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        let line = rendered.lines().last().unwrap();
        let expected = format!(
            "demo{}3/4{}75%{}0{}1  2-4",
            " ".repeat(26),
            " ".repeat(5),
            " ".repeat(4),
            " ".repeat(4)
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn fail_table_marks_aborted_sets() {
        let mut ts = TestSet::new("demo");
        ts.aborted = true;
        ts.exit = Some(ExitDisposition::Signaled {
            signal: 9,
            core_dumped: false,
        });
        let mut out = Vec::new();
        fail_summary(&mut out, &plain(), &[ts]).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        let line = rendered.lines().last().unwrap();
        let expected = format!(
            "demo{}0/0{}0%{}0{}--  aborted",
            " ".repeat(26),
            " ".repeat(6),
            " ".repeat(4),
            " ".repeat(3)
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn suite_summary_success() {
        let stats = RunStats {
            files: 3,
            total: 12,
            passed: 11,
            skipped: 1,
            failed: 0,
            aborted: 0,
        };
        let mut out = Vec::new();
        suite_summary(
            &mut out,
            &plain(),
            &stats,
            Duration::from_millis(1500),
            &ChildUsage {
                user: Duration::from_millis(250),
                system: Duration::from_millis(250),
            },
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nAll tests successful, 1 test skipped.\nFiles=3,  Tests=12,  1.50 seconds (0.25 usr + 0.25 sys = 0.50 CPU)\n"
        );
    }

    #[test]
    fn suite_summary_failures_and_aborts() {
        let stats = RunStats {
            files: 2,
            total: 8,
            passed: 6,
            skipped: 0,
            failed: 2,
            aborted: 0,
        };
        let mut out = Vec::new();
        suite_summary(&mut out, &plain(), &stats, Duration::ZERO, &ChildUsage::default()).unwrap();
        assert!(String::from_utf8(out.clone())
            .unwrap()
            .contains("Failed 2/8 tests, 75.00% okay."));

        let stats = RunStats {
            aborted: 1,
            ..stats
        };
        let mut out = Vec::new();
        suite_summary(&mut out, &plain(), &stats, Duration::ZERO, &ChildUsage::default()).unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Aborted 1 test set, passed 6/8 tests."));
    }
}
