// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [runtap](https://crates.io/crates/runtap), a TAP
//! (Test Anything Protocol) harness.
//!
//! runtap launches independent test programs, reads their standard output as
//! a line-oriented TAP stream, classifies each reported result, and produces
//! aggregate pass/fail statistics for the whole suite. Test programs run
//! strictly sequentially; each one is spawned, drained and reaped before the
//! next begins.

pub mod config;
pub mod errors;
mod helpers;
mod line_reader;
pub mod list;
pub mod log_file;
mod parser;
pub mod pragma;
mod reporter;
pub mod runner;
mod stopwatch;
mod test_command;
pub mod test_set;
mod usage;
