// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by runtap.
//!
//! Protocol violations (bad plans, duplicate test numbers, invalid pragmas
//! and the like) are not errors in this sense: they abort a single test set
//! and are reported through the normal summary path. The types here cover
//! the fatal, setup-level failures that terminate the whole run.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// A fatal error that terminates the whole suite.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HarnessError {
    /// The test list file could not be read.
    #[error("cannot read test list `{path}`")]
    ReadTestList {
        /// The path to the test list.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The pipe carrying a test program's output could not be created.
    #[error("cannot create pipe for `{program}`")]
    CreatePipe {
        /// The test program being started.
        program: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Waiting on a test program's exit status failed.
    #[error("cannot wait for test program `{program}`")]
    Wait {
        /// The test program being reaped.
        program: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Writing the report to the output stream failed.
    #[error("cannot write report output")]
    WriteOutput(#[source] io::Error),

    /// The async runtime driving child I/O could not be started.
    #[error("cannot start runtime")]
    Runtime(#[source] io::Error),

    /// The TAP log sink could not be opened.
    #[error(transparent)]
    Log(#[from] LogError),
}

/// An error opening the TAP log sink.
///
/// Writes to an open sink are best-effort and never fail the run, matching
/// the "no data interpreted, no data lost" contract of the log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LogError {
    /// The log file could not be opened.
    #[error("cannot open log file `{path}`")]
    Open {
        /// The path to the log file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}
