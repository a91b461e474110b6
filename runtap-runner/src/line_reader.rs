// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded line reader over a test program's output pipe.
//!
//! Produces one newline-terminated line per call. A producer that stalls is
//! retried with one-second waits up to a configured bound, then treated as
//! end-of-stream; the exit-status check afterwards is what distinguishes "no
//! more data" from "producer crashed". A line longer than the limit comes
//! back without its terminator so the parser can log it and drop it from
//! scoring; the overflow bytes are carried into the next call.

use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// One read from the stream.
#[derive(Debug)]
pub(crate) enum LineRead {
    /// A line, including its newline terminator. A line at the length limit
    /// with no terminator is returned as-is; the parser ignores it.
    Line(String),
    /// The stream closed, or the retry bound was exhausted. Partial data
    /// with no terminator is discarded.
    Eof,
    /// The stream failed. Partial data is discarded.
    Error(io::Error),
}

const READ_CHUNK: usize = 4 * 1024;
const RETRY_WAIT: Duration = Duration::from_secs(1);

pub(crate) struct LineReader<R> {
    inner: R,
    /// Bytes read but not yet returned as a line.
    carry: Vec<u8>,
    max_line: usize,
    retry_limit: u32,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub(crate) fn new(inner: R, max_line: usize, retry_limit: u32) -> Self {
        Self {
            inner,
            carry: Vec::with_capacity(READ_CHUNK),
            max_line,
            retry_limit,
            eof: false,
        }
    }

    /// Reads the next line. With `blocking` set, a stalled producer is
    /// retried indefinitely instead of up to the retry bound.
    pub(crate) async fn next_line(&mut self, blocking: bool) -> LineRead {
        loop {
            // A terminated line within the limit, or a full buffer, is
            // returned before reading any further.
            let window = self.max_line.min(self.carry.len());
            if let Some(pos) = self.carry[..window].iter().position(|b| *b == b'\n') {
                return LineRead::Line(take_prefix(&mut self.carry, pos + 1));
            }
            if self.carry.len() >= self.max_line {
                return LineRead::Line(take_prefix(&mut self.carry, self.max_line));
            }
            if self.eof {
                self.discard_partial();
                return LineRead::Eof;
            }

            let mut chunk = [0u8; READ_CHUNK];
            let mut retries = 0;
            let n = loop {
                match tokio::time::timeout(RETRY_WAIT, self.inner.read(&mut chunk)).await {
                    Ok(Ok(n)) => break n,
                    Ok(Err(error)) => {
                        self.discard_partial();
                        return LineRead::Error(error);
                    }
                    Err(_elapsed) => {
                        if blocking {
                            continue;
                        }
                        retries += 1;
                        if retries >= self.retry_limit {
                            self.discard_partial();
                            return LineRead::Eof;
                        }
                    }
                }
            };
            if n == 0 {
                self.eof = true;
            } else {
                self.carry.extend_from_slice(&chunk[..n]);
            }
        }
    }

    fn discard_partial(&mut self) {
        if !self.carry.is_empty() {
            tracing::debug!(
                "discarding {} bytes of unterminated output at end of stream",
                self.carry.len()
            );
            self.carry.clear();
        }
    }
}

fn take_prefix(carry: &mut Vec<u8>, len: usize) -> String {
    let rest = carry.split_off(len);
    let line = String::from_utf8_lossy(carry).into_owned();
    *carry = rest;
    line
}
