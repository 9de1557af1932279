//! `rootnet plan`: Print the address plan without starting anything.

use clap::Args;
use rootnet_common::types::Cidr;
use rootnet_core::address::plan_addresses;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Network range, e.g. `10.0.3.0/24`. Defaults to slirp4netns' built-in network.
    #[arg(long)]
    pub cidr: Option<Cidr>,
}

/// Executes the `plan` command.
///
/// # Errors
///
/// Returns an error if an address offset overflows the range.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let plan = plan_addresses(args.cidr.as_ref())?;
    super::print_json(&plan)
}
