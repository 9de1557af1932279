//! `rootnet child`: Accept a network message inside the namespace.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rootnet_common::types::NetworkMessage;
use rootnet_core::driver::{ChildDriver, Slirp4netnsChild};

/// Arguments for the `child` command.
#[derive(Args, Debug)]
pub struct ChildArgs {
    /// JSON network message to read. Reads stdin when omitted.
    #[arg(long)]
    pub message: Option<PathBuf>,
}

/// Executes the `child` command, printing the device to bring up.
///
/// # Errors
///
/// Returns an error if the message cannot be read or names no device.
pub fn execute(args: &ChildArgs) -> anyhow::Result<()> {
    let raw = match &args.message {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            let _ = std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading network message from stdin")?;
            buf
        }
    };
    let message: NetworkMessage =
        serde_json::from_str(&raw).context("parsing network message")?;

    let device = Slirp4netnsChild.configure_network_child(&message)?;
    tracing::info!(device = %device, "network message accepted");
    #[allow(clippy::print_stdout)]
    println!("{device}");
    Ok(())
}
