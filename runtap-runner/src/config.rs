// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Harness configuration.

use camino::Utf8PathBuf;
use std::io::IsTerminal;

/// Number of one-second retries the line reader performs on a stalled pipe
/// before treating the stream as closed.
pub const DEFAULT_READ_RETRIES: u32 = 20;

/// Largest line the reader will hand to the parser, including the newline.
/// Longer lines are returned unterminated and dropped from scoring.
pub const DEFAULT_MAX_LINE_BYTES: usize = 8192;

/// Configuration for a harness run.
///
/// The defaults correspond to running with no flags: quiet output, stderr
/// discarded, strict mode off, bounded non-blocking reads.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Verbosity level. At 1 and above, each scored result is printed on its
    /// own line as it arrives; at 3 and above, TAP comment lines are echoed.
    pub verbosity: u8,

    /// Merge the test program's stderr into the stream read by the parser
    /// instead of discarding it.
    pub capture_stderr: bool,

    /// Baseline for the `strict` pragma toggle.
    pub strict: bool,

    /// Baseline for the `readblock` pragma toggle. When on, the line reader
    /// retries a stalled pipe indefinitely instead of giving up after
    /// [`read_retries`](Self::read_retries) attempts.
    pub blocking_read: bool,

    /// Bound on one-second retries for reads that would block.
    pub read_retries: u32,

    /// Maximum line length handed to the parser.
    pub max_line_bytes: usize,

    /// Directory containing built test programs, exported to children as
    /// `BUILD` and searched by the path resolver.
    pub build_dir: Option<Utf8PathBuf>,

    /// Directory containing test sources, exported to children as `SOURCE`
    /// and searched by the path resolver.
    pub source_dir: Option<Utf8PathBuf>,

    /// Whether to draw the inline `current/expected` progress indicator.
    pub progress: ProgressMode,

    /// Where to log raw test output; `None` disables the log. The names
    /// `stdout` and `stderr` select those streams.
    pub log_path: Option<Utf8PathBuf>,

    /// Open the log in append mode instead of truncating.
    pub log_append: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            capture_stderr: false,
            strict: false,
            blocking_read: false,
            read_retries: DEFAULT_READ_RETRIES,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            build_dir: None,
            source_dir: None,
            progress: ProgressMode::Auto,
            log_path: None,
            log_append: false,
        }
    }
}

/// When to draw the inline progress indicator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ProgressMode {
    /// Draw only when stdout is a terminal.
    #[default]
    Auto,
    /// Never draw. Used when output is captured, e.g. in tests.
    Never,
    /// Always draw.
    Always,
}

impl ProgressMode {
    pub(crate) fn should_draw(self) -> bool {
        match self {
            ProgressMode::Auto => std::io::stdout().is_terminal(),
            ProgressMode::Never => false,
            ProgressMode::Always => true,
        }
    }
}
