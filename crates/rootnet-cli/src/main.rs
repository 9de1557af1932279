//! # rootnet: user-mode networking for rootless containers
//!
//! Detects what the installed `slirp4netns` supports, attaches it to a
//! container's network namespace, and validates the resulting network
//! message on the namespace side.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
