// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spawning test programs with controlled standard-stream redirection.
//!
//! A test program's stdout is always connected to a pipe read by the
//! harness. Its stderr is discarded by default, or merged into the same
//! pipe when stderr capture is enabled. Failures to set any of this up are
//! folded into the reserved exit codes so that classification treats them
//! exactly like a child that died before its first line of TAP.

use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use camino::Utf8Path;
use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child as TokioChild, ChildStdout};

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        #[path = "test_command/unix.rs"]
        mod os;
    } else if #[cfg(windows)] {
        #[path = "test_command/windows.rs"]
        mod os;
    } else {
        compile_error!("unsupported target platform");
    }
}

/// Reserved exit code: stdout or stderr could not be redirected.
pub(crate) const CHILDERR_DUP: i32 = 100;
/// Reserved exit code: the test program could not be executed.
pub(crate) const CHILDERR_EXEC: i32 = 101;
/// Reserved exit code: the discard target for stderr could not be opened.
pub(crate) const CHILDERR_STDERR: i32 = 102;

/// A test program's termination status, decoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ExitDisposition {
    /// Exited normally with the given code. The reserved `CHILDERR_*` codes
    /// travel through here and are picked apart during classification.
    Exited(i32),
    /// Terminated by a signal.
    Signaled {
        signal: i32,
        core_dumped: bool,
    },
}

impl ExitDisposition {
    pub(crate) fn from_status(status: std::process::ExitStatus) -> Self {
        os::decode_status(status)
    }

    /// The value shown in the failure table's `Stat` column, if the program
    /// exited normally.
    pub(crate) fn exit_code(&self) -> Option<i32> {
        match self {
            ExitDisposition::Exited(code) => Some(*code),
            ExitDisposition::Signaled { .. } => None,
        }
    }
}

/// The readable end of a spawned test program's output.
pub(crate) enum ChildStream {
    /// stdout only; stderr goes to the discard target.
    Piped(ChildStdout),
    /// stdout and stderr merged through one pipe.
    Combined(tokio::fs::File),
}

impl AsyncRead for ChildStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ChildStream::Piped(stdout) => Pin::new(stdout).poll_read(cx, buf),
            ChildStream::Combined(file) => Pin::new(file).poll_read(cx, buf),
        }
    }
}

/// A spawned test program along with the stream carrying its output.
pub(crate) struct Child {
    pub(crate) child: TokioChild,
    pub(crate) stream: ChildStream,
}

/// The result of trying to start a test program.
pub(crate) enum SpawnResult {
    /// The program is running; read its output from the stream.
    Running(Child),
    /// The program never started. The disposition carries the reserved exit
    /// code matching the failure, so the reporter prints the same fixed
    /// abort message a failed child-side setup would produce.
    Failed(ExitDisposition),
}

/// Starts `path` with its stdout connected to a pipe we read, and its
/// stderr either discarded or merged into that pipe.
///
/// Pipe creation failures are fatal; spawn failures are not, and surface as
/// a [`SpawnResult::Failed`] carrying a reserved exit code.
pub(crate) fn spawn(path: &Utf8Path, config: &HarnessConfig) -> Result<SpawnResult, HarnessError> {
    let mut cmd = std::process::Command::new(path.as_std_path());
    cmd.stdin(Stdio::null());

    // Export SOURCE and BUILD so tests can locate their data files.
    if let Some(source) = &config.source_dir {
        cmd.env("SOURCE", source.as_str());
    }
    if let Some(build) = &config.build_dir {
        cmd.env("BUILD", build.as_str());
    }

    let combined = if config.capture_stderr {
        let (rx, tx) = io::pipe().map_err(|source| HarnessError::CreatePipe {
            program: path.to_owned(),
            source,
        })?;
        let tx_clone = tx.try_clone().map_err(|source| HarnessError::CreatePipe {
            program: path.to_owned(),
            source,
        })?;
        cmd.stdout(tx_clone).stderr(tx);
        Some(rx)
    } else {
        cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        None
    };

    let mut cmd: tokio::process::Command = cmd.into();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(error) => {
            tracing::debug!("failed to spawn `{path}`: {error}");
            return Ok(SpawnResult::Failed(ExitDisposition::Exited(
                spawn_error_code(&error),
            )));
        }
    };

    let stream = match combined {
        Some(rx) => ChildStream::Combined(tokio::fs::File::from_std(os::pipe_reader_to_file(rx))),
        None => {
            let stdout = child.stdout.take().expect("stdout was set to piped");
            ChildStream::Piped(stdout)
        }
    };

    Ok(SpawnResult::Running(Child { child, stream }))
}

/// Maps a parent-side spawn error onto the reserved exit code the
/// equivalent child-side failure would have produced.
fn spawn_error_code(error: &io::Error) -> i32 {
    match error.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => CHILDERR_EXEC,
        _ => CHILDERR_DUP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_codes() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(spawn_error_code(&not_found), CHILDERR_EXEC);
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "no");
        assert_eq!(spawn_error_code(&denied), CHILDERR_EXEC);
        let other = io::Error::other("boom");
        assert_eq!(spawn_error_code(&other), CHILDERR_DUP);
    }

    #[test]
    fn exit_code_only_for_normal_exits() {
        assert_eq!(ExitDisposition::Exited(3).exit_code(), Some(3));
        let sig = ExitDisposition::Signaled {
            signal: 11,
            core_dumped: true,
        };
        assert_eq!(sig.exit_code(), None);
    }
}
