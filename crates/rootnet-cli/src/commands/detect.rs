//! `rootnet detect`: Show which optional switches the helper supports.

use clap::Args;
use rootnet_common::constants::DEFAULT_BINARY;
use rootnet_core::capability::detect_capabilities;

/// Arguments for the `detect` command.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Helper binary name or path.
    #[arg(long, default_value = DEFAULT_BINARY)]
    pub binary: String,
}

/// Executes the `detect` command.
///
/// # Errors
///
/// Returns an error if the helper is missing or its `--help` fails.
pub fn execute(args: &DetectArgs) -> anyhow::Result<()> {
    let caps = detect_capabilities(&args.binary)?;
    super::print_json(&caps)
}
