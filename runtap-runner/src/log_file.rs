// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The TAP log sink.
//!
//! When a log is open, every line of child output passes through it,
//! including truncated and bail-out lines the parser refuses to score, so
//! the record stays complete even when scoring drops data. Writes are
//! best-effort; a sink that was never opened is a no-op.

use crate::errors::LogError;
use camino::Utf8Path;
use std::fs::{File, OpenOptions};
use std::io::Write;

enum Target {
    Stdout,
    Stderr,
    File(File),
}

/// A line-oriented sink for raw test output.
pub struct LogSink {
    target: Option<Target>,
}

impl LogSink {
    /// A sink that discards everything.
    pub fn closed() -> Self {
        Self { target: None }
    }

    /// Opens a sink. The names `stdout` and `stderr` select those streams;
    /// anything else is a file path, truncated unless `append` is set.
    pub fn open(path: &Utf8Path, append: bool) -> Result<Self, LogError> {
        let target = match path.as_str() {
            "stdout" => Target::Stdout,
            "stderr" => Target::Stderr,
            _ => {
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(append)
                    .truncate(!append)
                    .open(path)
                    .map_err(|source| LogError::Open {
                        path: path.to_owned(),
                        source,
                    })?;
                Target::File(file)
            }
        };
        Ok(Self {
            target: Some(target),
        })
    }

    /// Writes `text` exactly as given.
    pub(crate) fn write(&mut self, text: &str) {
        self.write_impl(text.as_bytes());
    }

    /// Writes `text` followed by a newline.
    pub(crate) fn writeln(&mut self, text: &str) {
        self.write_impl(text.as_bytes());
        self.write_impl(b"\n");
    }

    fn write_impl(&mut self, bytes: &[u8]) {
        let Some(target) = &mut self.target else {
            return;
        };
        let result = match target {
            Target::Stdout => std::io::stdout().write_all(bytes),
            Target::Stderr => std::io::stderr().write_all(bytes),
            Target::File(file) => file.write_all(bytes).and_then(|()| file.flush()),
        };
        if let Err(error) = result {
            tracing::warn!("log write failed: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;

    #[test]
    fn closed_sink_discards() {
        let mut sink = LogSink::closed();
        sink.write("ok 1\n");
        sink.writeln("Bail out!");
    }

    #[test]
    fn file_sink_records_lines() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        let mut sink = LogSink::open(&path, false).unwrap();
        sink.write("1..1\n");
        sink.writeln("partial line");
        drop(sink);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "1..1\npartial line\n");
    }

    #[test]
    fn append_mode_keeps_existing_contents() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, "earlier\n").unwrap();
        let mut sink = LogSink::open(&path, true).unwrap();
        sink.write("later\n");
        drop(sink);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "earlier\nlater\n");

        // Without append the file is truncated.
        let mut sink = LogSink::open(&path, false).unwrap();
        sink.write("fresh\n");
        drop(sink);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "fresh\n");
    }
}
