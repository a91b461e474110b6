// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::eyre::{bail, Result, WrapErr};
use runtap_runner::{
    config::HarnessConfig,
    list::{find_test, read_test_list},
    runner::TestHarness,
};
use std::io::{IsTerminal, Write};

/// A TAP test harness.
///
/// Runs each test program listed on the command line, or each test named in
/// a list file with -l, reads its output as a TAP stream, and summarizes the
/// results for the whole suite.
#[derive(Debug, Parser)]
#[command(version, bin_name = "runtap")]
pub(crate) struct RuntapApp {
    /// Set the build directory, exported to tests as BUILD
    #[arg(short = 'b', long = "build-dir", value_name = "BUILD-DIR")]
    build_dir: Option<Utf8PathBuf>,

    /// Set the source directory, exported to tests as SOURCE
    #[arg(short = 's', long = "source-dir", value_name = "SOURCE-DIR")]
    source_dir: Option<Utf8PathBuf>,

    /// Take the list of tests to run from a file
    #[arg(short = 'l', long = "list", value_name = "TEST-LIST", conflicts_with = "tests")]
    list: Option<Utf8PathBuf>,

    /// Run a single test rather than a list of tests, showing its complete
    /// output
    #[arg(short = 'o', long = "single", conflicts_with = "list")]
    single: bool,

    /// Log test output to a path; the names `stdout` and `stderr` select
    /// those streams
    #[arg(short = 'L', long = "log", value_name = "LOG-PATH")]
    log: Option<Utf8PathBuf>,

    /// With -L, open the log in append mode
    #[arg(short = 'a', long = "append-log", requires = "log")]
    append: bool,

    /// Verbose; repeat for more output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Capture test stderr into the TAP stream
    #[arg(short = 'e', long = "capture-stderr")]
    capture_stderr: bool,

    /// Pedantic (strict TAP)
    #[arg(short = 'p', long = "strict")]
    strict: bool,

    /// Tests to run
    #[arg(value_name = "TEST", required_unless_present = "list")]
    tests: Vec<String>,
}

impl RuntapApp {
    /// Executes the app, returning the process exit code.
    pub(crate) fn exec(self) -> Result<i32> {
        let config = HarnessConfig {
            verbosity: self.verbose,
            capture_stderr: self.capture_stderr,
            strict: self.strict,
            build_dir: self.build_dir,
            source_dir: self.source_dir,
            log_path: self.log,
            log_append: self.append,
            ..HarnessConfig::default()
        };

        if self.single {
            let [name] = self.tests.as_slice() else {
                bail!("-o runs exactly one test");
            };
            return exec_single(name, &config);
        }

        let mut stdout = std::io::stdout().lock();
        let tests = match &self.list {
            Some(list) => {
                let shortlist = list.file_name().unwrap_or(list.as_str());
                write!(
                    stdout,
                    "\nRunning all tests listed in {shortlist}.  If any tests fail, run the failing\ntest program with runtap -o to see more details.\n\n"
                )?;
                read_test_list(list).wrap_err("cannot read test list")?
            }
            None => self.tests,
        };

        let harness = TestHarness::new(config).colorize(std::io::stdout().is_terminal());
        let report = harness.run(&tests, &mut stdout)?;
        Ok(if report.success { 0 } else { 1 })
    }
}

/// Runs one test program directly, with its output left on our own standard
/// streams.
#[cfg(unix)]
fn exec_single(name: &str, config: &HarnessConfig) -> Result<i32> {
    use std::os::unix::process::CommandExt;

    let path = find_test(name, config);
    let mut cmd = single_command(&path, config);
    // exec only returns on failure.
    let error = cmd.exec();
    Err(error).wrap_err_with(|| format!("cannot exec {path}"))
}

#[cfg(not(unix))]
fn exec_single(name: &str, config: &HarnessConfig) -> Result<i32> {
    let path = find_test(name, config);
    let status = single_command(&path, config)
        .status()
        .wrap_err_with(|| format!("cannot run {path}"))?;
    Ok(status.code().unwrap_or(1))
}

fn single_command(path: &camino::Utf8Path, config: &HarnessConfig) -> std::process::Command {
    let mut cmd = std::process::Command::new(path.as_std_path());
    if let Some(source) = &config.source_dir {
        cmd.env("SOURCE", source.as_str());
    }
    if let Some(build) = &config.build_dir {
        cmd.env("BUILD", build.as_str());
    }
    cmd
}
