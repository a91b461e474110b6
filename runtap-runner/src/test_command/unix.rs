// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ExitDisposition;
use std::fs::File;
use std::io::PipeReader;
use std::os::fd::OwnedFd;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

pub(super) fn pipe_reader_to_file(rx: PipeReader) -> File {
    File::from(OwnedFd::from(rx))
}

pub(super) fn decode_status(status: ExitStatus) -> ExitDisposition {
    match status.code() {
        Some(code) => ExitDisposition::Exited(code),
        None => ExitDisposition::Signaled {
            // A status with no exit code carries a signal on Unix.
            signal: status.signal().unwrap_or(0),
            core_dumped: status.core_dumped(),
        },
    }
}
