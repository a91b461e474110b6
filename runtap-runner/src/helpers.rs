// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for runtap-runner.

/// Utilities for pluralizing various words based on count.
pub(crate) mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub(crate) fn tests_str(count: u64) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "test set" if `count` is 1, otherwise "test sets".
    pub(crate) fn test_sets_str(count: u64) -> &'static str {
        if count == 1 { "test set" } else { "test sets" }
    }
}

/// Strips one trailing newline (and a preceding carriage return, if any)
/// from a protocol line.
pub(crate) fn trim_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_newline_variants() {
        assert_eq!(trim_newline("ok 1\n"), "ok 1");
        assert_eq!(trim_newline("ok 1\r\n"), "ok 1");
        assert_eq!(trim_newline("ok 1"), "ok 1");
        assert_eq!(trim_newline("\n"), "");
        assert_eq!(trim_newline(""), "");
    }
}
