// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod dispatch;

use clap::Parser;
use color_eyre::Result;
use dispatch::RuntapApp;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;

    let filter =
        EnvFilter::try_from_env("RUNTAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = RuntapApp::parse();
    let code = app.exec()?;
    std::process::exit(code)
}
