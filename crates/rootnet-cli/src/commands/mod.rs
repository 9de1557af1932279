//! CLI command definitions and dispatch.

pub mod attach;
pub mod child;
pub mod detect;
pub mod plan;

use clap::{Parser, Subcommand};

/// rootnet: user-mode networking for rootless containers.
#[derive(Parser, Debug)]
#[command(name = "rootnet", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which optional switches the installed helper supports.
    Detect(detect::DetectArgs),
    /// Print the address plan for a range (or the defaults).
    Plan(plan::PlanArgs),
    /// Attach a user-mode network to a running process until Ctrl+C.
    Attach(attach::AttachArgs),
    /// Validate a network message on the namespace side.
    Child(child::ChildArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Detect(args) => detect::execute(&args),
        Command::Plan(args) => plan::execute(&args),
        Command::Attach(args) => attach::execute(args),
        Command::Child(args) => child::execute(&args),
    }
}

/// Prints `value` as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    #[allow(clippy::print_stdout)]
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
