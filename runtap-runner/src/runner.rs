// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The suite driver.
//!
//! Runs each test program in turn: resolve its path, spawn it, feed its
//! output through the line reader and parser, reap it, classify the result,
//! and accumulate suite totals. Failing sets are kept aside for the tabular
//! breakdown printed before the closing summary.

use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::line_reader::{LineRead, LineReader};
use crate::list::find_test;
use crate::log_file::LogSink;
use crate::parser::LineParser;
use crate::pragma::PragmaContext;
use crate::reporter::{self, Styles};
use crate::stopwatch::stopwatch;
use crate::test_command::{self, ExitDisposition, SpawnResult};
use crate::test_set::{PlanStatus, TestSet};
use crate::usage::children_usage;
use std::io::Write;

/// Cumulative totals across a suite run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunStats {
    /// Number of test files run.
    pub files: u64,
    /// Total tests, net of skips.
    pub total: u64,
    /// Tests that passed.
    pub passed: u64,
    /// Tests that were skipped, including whole skipped files.
    pub skipped: u64,
    /// Tests that failed, including missing results.
    pub failed: u64,
    /// Test sets that aborted.
    pub aborted: u64,
}

/// The outcome of a suite run.
#[derive(Clone, Copy, Debug)]
pub struct RunReport {
    /// The cumulative totals.
    pub stats: RunStats,
    /// True iff no test failed and no test set aborted.
    pub success: bool,
}

/// Runs a list of test programs and reports on them.
pub struct TestHarness {
    config: HarnessConfig,
    styles: Styles,
}

impl TestHarness {
    /// Creates a harness with the given configuration and plain output.
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            styles: Styles::default(),
        }
    }

    /// Enables or disables colorized report output.
    pub fn colorize(mut self, colorize: bool) -> Self {
        if colorize {
            self.styles.colorize();
        }
        self
    }

    /// Runs every named test and writes the live report to `out`.
    pub fn run(&self, tests: &[String], out: &mut dyn Write) -> Result<RunReport, HarnessError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(HarnessError::Runtime)?;
        runtime.block_on(self.run_impl(tests, out))
    }

    async fn run_impl(
        &self,
        tests: &[String],
        out: &mut dyn Write,
    ) -> Result<RunReport, HarnessError> {
        let start = stopwatch();
        tracing::debug!("suite started at {}", start.start_time());

        let mut log = match &self.config.log_path {
            Some(path) => LogSink::open(path, self.config.log_append)?,
            None => LogSink::closed(),
        };
        let mut pragmas = PragmaContext::new(&self.config);
        let show_progress = self.config.verbosity == 0 && self.config.progress.should_draw();

        // The column for test names is the longest name plus two, rounded up
        // to a tab stop.
        let longest = tests.iter().map(String::len).max().unwrap_or(0);
        let longest = (longest + 2).next_multiple_of(8);

        let mut stats = RunStats::default();
        let mut fails: Vec<TestSet> = Vec::new();

        for name in tests {
            write_name(out, name, longest).map_err(HarnessError::WriteOutput)?;
            if self.config.verbosity >= 1 {
                writeln!(out).map_err(HarnessError::WriteOutput)?;
            }
            out.flush().map_err(HarnessError::WriteOutput)?;

            let mut ts = TestSet::new(name.as_str());
            ts.path = find_test(name, &self.config);
            self.run_one(&mut ts, &mut pragmas, &mut log, show_progress, out, longest)
                .await?;

            let succeeded = reporter::analyze(out, &self.styles, &mut ts)
                .map_err(HarnessError::WriteOutput)?;
            // Tests the plan promised but the stream never delivered count
            // as failures in the totals and the breakdown.
            let missing = ts.fail_missing();
            let succeeded = succeeded && !missing;

            stats.files += 1;
            stats.aborted += u64::from(ts.aborted);
            stats.total += ts.count as u64 + u64::from(ts.all_skipped);
            stats.passed += ts.passed;
            stats.skipped += ts.skipped + u64::from(ts.all_skipped);
            stats.failed += ts.failed;

            if !succeeded {
                fails.push(ts);
            }
            out.flush().map_err(HarnessError::WriteOutput)?;
        }
        stats.total -= stats.skipped;

        if !fails.is_empty() {
            reporter::fail_summary(out, &self.styles, &fails).map_err(HarnessError::WriteOutput)?;
        }

        let wall = start.snapshot().duration;
        let usage = children_usage();
        reporter::suite_summary(out, &self.styles, &stats, wall, &usage)
            .map_err(HarnessError::WriteOutput)?;
        out.flush().map_err(HarnessError::WriteOutput)?;

        Ok(RunReport {
            success: stats.failed == 0 && stats.aborted == 0,
            stats,
        })
    }

    /// Runs one test program to completion, filling in `ts`.
    async fn run_one(
        &self,
        ts: &mut TestSet,
        pragmas: &mut PragmaContext,
        log: &mut LogSink,
        show_progress: bool,
        out: &mut dyn Write,
        longest: usize,
    ) -> Result<(), HarnessError> {
        let spawned = test_command::spawn(&ts.path, &self.config)?;

        // Toggles never leak from one test program into the next.
        pragmas.reset_all();

        match spawned {
            SpawnResult::Failed(disposition) => {
                ts.exit = Some(disposition);
                ts.aborted = true;
                // The name column precedes the report line here too.
                if self.config.verbosity >= 1 {
                    write_name(out, &ts.name, longest).map_err(HarnessError::WriteOutput)?;
                }
            }
            SpawnResult::Running(mut child) => {
                let mut reader = LineReader::new(
                    child.stream,
                    self.config.max_line_bytes,
                    self.config.read_retries,
                );
                while !ts.aborted {
                    match reader.next_line(pragmas.blocking_read).await {
                        LineRead::Line(line) => {
                            let mut parser =
                                LineParser::new(&self.config, show_progress, pragmas, log, out);
                            parser
                                .check_line(ts, &line)
                                .map_err(HarnessError::WriteOutput)?;
                        }
                        LineRead::Eof => break,
                        LineRead::Error(error) => {
                            tracing::warn!("error reading from `{}`: {error}", ts.path);
                            break;
                        }
                    }
                }
                if ts.plan == PlanStatus::Unset {
                    ts.aborted = true;
                }
                if self.config.verbosity >= 1 {
                    write_name(out, &ts.name, longest).map_err(HarnessError::WriteOutput)?;
                } else {
                    reporter::erase_progress(out, ts).map_err(HarnessError::WriteOutput)?;
                }

                // Drain whatever the program still prints, so the log stays
                // complete and the pipe cannot fill up before the reap.
                loop {
                    match reader.next_line(pragmas.blocking_read).await {
                        LineRead::Line(line) => log.writeln(crate::helpers::trim_newline(&line)),
                        LineRead::Eof | LineRead::Error(_) => break,
                    }
                }
                drop(reader);

                let status = match child.child.wait().await {
                    Ok(status) => status,
                    Err(source) => {
                        if !ts.reported {
                            writeln!(out, "ABORTED").map_err(HarnessError::WriteOutput)?;
                        }
                        return Err(HarnessError::Wait {
                            program: ts.path.clone(),
                            source,
                        });
                    }
                };
                ts.exit = Some(ExitDisposition::from_status(status));
            }
        }

        // A fully skipped file is not a failure, whatever else happened.
        if ts.all_skipped {
            ts.aborted = false;
        }
        Ok(())
    }
}

fn write_name(out: &mut dyn Write, name: &str, longest: usize) -> std::io::Result<()> {
    write!(out, "{name}")?;
    for _ in name.len()..longest {
        write!(out, ".")?;
    }
    Ok(())
}
