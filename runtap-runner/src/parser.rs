// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The TAP stream parser.
//!
//! A state machine fed one line at a time. Each line is classified in a
//! fixed order, short-circuiting at the first match: bail-out, unterminated
//! line, version header, pragma directives (TAP 13+), comment, plan, result.
//! Anything else is ignored for scoring but still captured by the log sink.
//! Protocol violations abort the current test set only; the caller checks
//! [`TestSet::aborted`](crate::test_set::TestSet) to stop feeding lines.

use crate::config::HarnessConfig;
use crate::helpers::trim_newline;
use crate::log_file::LogSink;
use crate::pragma::{self, PragmaContext};
use crate::reporter::erase_progress;
use crate::test_set::{PlanStatus, TestSet, TestStatus};
use std::io::{self, Write};

const BAIL_MARKER: &str = "Bail out!";

pub(crate) struct LineParser<'a> {
    config: &'a HarnessConfig,
    show_progress: bool,
    pragmas: &'a mut PragmaContext,
    log: &'a mut LogSink,
    out: &'a mut dyn Write,
}

impl<'a> LineParser<'a> {
    pub(crate) fn new(
        config: &'a HarnessConfig,
        show_progress: bool,
        pragmas: &'a mut PragmaContext,
        log: &'a mut LogSink,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            config,
            show_progress,
            pragmas,
            log,
            out,
        }
    }

    /// Feeds one line to the state machine, mutating `ts`. After this
    /// returns, `ts.aborted` tells the caller whether to stop.
    pub(crate) fn check_line(&mut self, ts: &mut TestSet, line: &str) -> io::Result<()> {
        // A test abort takes priority over everything, terminated or not.
        if let Some(pos) = line.find(BAIL_MARKER) {
            self.log.writeln(trim_newline(line));
            let reason = trim_newline(line[pos + BAIL_MARKER.len()..].trim_start());
            if !reason.is_empty() {
                erase_progress(self.out, ts)?;
                writeln!(self.out, "ABORTED ({reason})")?;
                ts.reported = true;
            }
            ts.aborted = true;
            return Ok(());
        }

        // A line with no terminator was truncated at the buffer limit:
        // logged, never parsed.
        if !line.ends_with('\n') {
            self.log.writeln(line);
            return Ok(());
        }
        self.log.write(line);

        // The version header is only meaningful before anything else has
        // established a version; everything after the first line defaults
        // to TAP 12.
        if ts.tap_version.is_none() {
            if let Some(rest) = line.strip_prefix("TAP version ") {
                let (version, _) = leading_i64(rest);
                let version = version.unwrap_or(0);
                ts.tap_version = Some(version);
                if version < 13 {
                    writeln!(self.out, "ABORTED (Invalid TAP version: {version})")?;
                    ts.reported = true;
                    ts.aborted = true;
                }
                return Ok(());
            }
            ts.tap_version = Some(12);
        }

        // Pragma support arrived in TAP 13.
        if ts.tap_version >= Some(13) {
            if let Some(rest) = strip_pragma_keyword(line.trim_start()) {
                if !pragma::apply_directives(trim_newline(rest), self.pragmas) {
                    erase_progress(self.out, ts)?;
                    writeln!(self.out, "ABORTED (invalid pragma)")?;
                    ts.aborted = true;
                    ts.reported = true;
                }
                return Ok(());
            }
            // Pragmas may claim ownership of further lines before ordinary
            // parsing sees them.
            if pragma::check_line(line, ts, self.pragmas) {
                return Ok(());
            }
        }

        if line.starts_with('#') {
            if self.config.verbosity >= 3 {
                write!(self.out, "{line}")?;
            }
            return Ok(());
        }

        if line.starts_with("1..") {
            match ts.plan {
                PlanStatus::Unset | PlanStatus::PlanPending => return self.parse_plan(ts, line),
                PlanStatus::PlanFirst | PlanStatus::PlanFinal => {
                    erase_progress(self.out, ts)?;
                    writeln!(self.out, "ABORTED (multiple plans)")?;
                    ts.aborted = true;
                    ts.reported = true;
                    return Ok(());
                }
            }
        }

        self.parse_result(ts, line)
    }

    /// Handles a `1..N` plan line. The caller has already established that
    /// the plan state admits one.
    fn parse_plan(&mut self, ts: &mut TestSet, line: &str) -> io::Result<()> {
        let rest = &line[3..];
        let (n, after) = leading_i64(rest);
        let n = n.unwrap_or(0);

        // `1..0 # skip <reason>` skips the whole file; the statistics no
        // longer mean anything, so zero them.
        if n == 0 {
            let after = after.trim_start();
            if let Some(comment) = after.strip_prefix('#') {
                let comment = comment.trim_start();
                // Byte-wise compare: the comment may hold arbitrary UTF-8,
                // so a char-boundary-blind `[..4]` slice could panic.
                let bytes = comment.as_bytes();
                if bytes.len() >= 4 && bytes[..4].eq_ignore_ascii_case(b"skip") {
                    let reason = trim_newline(comment[4..].trim_start());
                    if !reason.is_empty() {
                        ts.skip_reason = Some(reason.to_owned());
                    }
                    ts.all_skipped = true;
                    ts.aborted = true;
                    ts.count = 0;
                    ts.passed = 0;
                    ts.skipped = 0;
                    ts.failed = 0;
                    return Ok(());
                }
            }
        }
        if n <= 0 {
            writeln!(self.out, "ABORTED (invalid test count)")?;
            ts.aborted = true;
            ts.reported = true;
            return Ok(());
        }
        let n = n as usize;

        match ts.plan {
            PlanStatus::Unset => {
                ts.count = n;
                ts.grow_results_exact(n);
                ts.plan = PlanStatus::PlanFirst;
            }
            PlanStatus::PlanPending => {
                // A late plan may not declare fewer tests than have already
                // been seen.
                if n < ts.count {
                    erase_progress(self.out, ts)?;
                    writeln!(self.out, "ABORTED (invalid test number {})", ts.count)?;
                    ts.aborted = true;
                    ts.reported = true;
                    return Ok(());
                }
                ts.count = n;
                ts.grow_results_exact(n);
                ts.plan = PlanStatus::PlanFinal;
            }
            PlanStatus::PlanFirst | PlanStatus::PlanFinal => unreachable!("checked by caller"),
        }
        Ok(())
    }

    /// Handles a candidate result line, ignoring anything that doesn't
    /// match `[not ]ok[ <number>][ # directive]`.
    fn parse_result(&mut self, ts: &mut TestSet, line: &str) -> io::Result<()> {
        let mut status = TestStatus::Pass;
        let mut rest = line;
        if let Some(stripped) = rest.strip_prefix("not ") {
            status = TestStatus::Fail;
            rest = stripped;
        }
        let Some(stripped) = rest.strip_prefix("ok") else {
            if self.pragmas.strict && !trim_newline(line).trim().is_empty() {
                tracing::warn!("non-TAP output in strict mode: {:?}", trim_newline(line));
                // The original harness never rejected these lines; keep
                // classification unchanged.
            }
            return Ok(());
        };
        let rest = stripped.trim_start();

        let (number, after_number) = leading_i64(rest);
        let number = number.unwrap_or(ts.current as i64 + 1);
        if number <= 0
            || (ts.plan == PlanStatus::PlanFirst && number as usize > ts.count)
        {
            erase_progress(self.out, ts)?;
            writeln!(self.out, "ABORTED (invalid test number {number})")?;
            ts.aborted = true;
            ts.reported = true;
            return Ok(());
        }
        let current = number as usize;

        // With no final plan yet the table tracks the highest number seen.
        if matches!(ts.plan, PlanStatus::Unset | PlanStatus::PlanPending) {
            ts.plan = PlanStatus::PlanPending;
            if current > ts.count {
                ts.count = current;
            }
            ts.grow_results(current);
        }

        // Directives ride in the comment: `# skip` forces a skip, `# todo`
        // rescues an expected failure (and only an expected failure).
        if let Some(hash) = after_number.find('#') {
            let directive = after_number[hash + 1..].trim_start();
            // Byte-wise compare, as above: the directive text is arbitrary
            // UTF-8 and byte 4 need not be a char boundary.
            let bytes = directive.as_bytes();
            if bytes.len() >= 4 {
                if bytes[..4].eq_ignore_ascii_case(b"skip") {
                    status = TestStatus::Skip;
                } else if bytes[..4].eq_ignore_ascii_case(b"todo") {
                    status = if status == TestStatus::Fail {
                        TestStatus::Skip
                    } else {
                        TestStatus::Fail
                    };
                }
            }
        }

        let slot = match ts.result(current) {
            Some(slot) => slot,
            None => {
                // A frozen plan leaves numbers past the table unchecked by
                // the count test above; they are still invalid.
                erase_progress(self.out, ts)?;
                writeln!(self.out, "ABORTED (invalid test number {current})")?;
                ts.aborted = true;
                ts.reported = true;
                return Ok(());
            }
        };
        if slot != TestStatus::Invalid {
            erase_progress(self.out, ts)?;
            writeln!(self.out, "ABORTED (duplicate test number {current})")?;
            ts.aborted = true;
            ts.reported = true;
            return Ok(());
        }
        ts.record(current, status);

        if self.config.verbosity >= 1 {
            let label = match status {
                TestStatus::Pass => "PASS",
                TestStatus::Fail => "FAIL",
                TestStatus::Skip => "SKIP",
                TestStatus::Invalid => "MISSING",
            };
            // Only the text after the test number is echoed.
            let remainder = trim_newline(after_number.trim_start());
            if remainder.is_empty() {
                writeln!(self.out, "  {current:3} {label}")?;
            } else {
                writeln!(self.out, "  {current:3} {remainder}: {label}")?;
            }
            self.out.flush()?;
        } else if self.show_progress {
            erase_progress(self.out, ts)?;
            let indicator = if ts.plan == PlanStatus::PlanPending {
                format!("{current}/?")
            } else {
                format!("{current}/{}", ts.count)
            };
            write!(self.out, "{indicator}")?;
            ts.progress_len = indicator.len();
            self.out.flush()?;
        }
        Ok(())
    }
}

/// Strips a leading `pragma` keyword, requiring a token boundary so words
/// that merely start with "pragma" aren't misparsed as directives.
fn strip_pragma_keyword(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("pragma")?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}

/// Parses a leading (optionally signed) decimal integer, skipping leading
/// whitespace, and returns it with the text after the digits. Overflow is
/// a parse failure.
fn leading_i64(s: &str) -> (Option<i64>, &str) {
    let s = s.trim_start();
    let (negative, digits_start) = match s.as_bytes().first() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    };
    let digits_end = s[digits_start..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count()
        + digits_start;
    if digits_end == digits_start {
        return (None, s);
    }
    let Ok(magnitude) = s[digits_start..digits_end].parse::<i64>() else {
        return (None, s);
    };
    let value = if negative { -magnitude } else { magnitude };
    (Some(value), &s[digits_end..])
}
