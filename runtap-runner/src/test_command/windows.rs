// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ExitDisposition;
use std::fs::File;
use std::io::PipeReader;
use std::os::windows::io::OwnedHandle;
use std::process::ExitStatus;

pub(super) fn pipe_reader_to_file(rx: PipeReader) -> File {
    File::from(OwnedHandle::from(rx))
}

pub(super) fn decode_status(status: ExitStatus) -> ExitDisposition {
    // There are no termination signals on Windows; a killed process shows
    // up as an exit code.
    ExitDisposition::Exited(status.code().unwrap_or(1))
}
