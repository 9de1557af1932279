//! `rootnet attach`: Attach a user-mode network to a running process.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Args;
use rootnet_common::config::DriverConfig;
use rootnet_common::constants::default_state_dir;
use rootnet_common::types::Cidr;
use rootnet_core::capability::detect_capabilities;
use rootnet_core::driver::{ParentDriver, Slirp4netnsParent};

/// Arguments for the `attach` command.
#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Process whose network namespace receives the link.
    #[arg(long)]
    pub pid: u32,

    /// JSON driver configuration. Flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Helper binary name or path.
    #[arg(long)]
    pub binary: Option<String>,

    /// Link MTU (0 selects 65520).
    #[arg(long, allow_negative_numbers = true)]
    pub mtu: Option<i32>,

    /// Network range, e.g. `10.0.3.0/24`.
    #[arg(long)]
    pub cidr: Option<Cidr>,

    /// Prohibit connecting to the host loopback from the namespace.
    #[arg(long)]
    pub disable_host_loopback: bool,

    /// Control socket for the helper's API.
    #[arg(long)]
    pub api_socket: Option<PathBuf>,

    /// Ask the helper to sandbox itself.
    #[arg(long)]
    pub create_sandbox: bool,

    /// Scratch directory for this attachment.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

impl AttachArgs {
    fn driver_config(&self) -> anyhow::Result<DriverConfig> {
        let mut config = match &self.config {
            Some(path) => DriverConfig::from_file(path)?,
            None => DriverConfig::default(),
        };
        if let Some(binary) = &self.binary {
            config.binary.clone_from(binary);
        }
        if let Some(mtu) = self.mtu {
            config.mtu = mtu;
        }
        if let Some(cidr) = self.cidr {
            config.cidr = Some(cidr);
        }
        if let Some(path) = &self.api_socket {
            config.api_socket = Some(path.clone());
        }
        config.disable_host_loopback |= self.disable_host_loopback;
        config.create_sandbox |= self.create_sandbox;
        Ok(config)
    }
}

/// Executes the `attach` command.
///
/// Prints the network message as JSON on stdout, then keeps the helper
/// running until Ctrl+C or `SIGTERM` and tears it down. A signal that
/// arrives while configuring ends the wait immediately.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the helper lacks a
/// requested switch, or the network cannot be configured.
pub fn execute(args: AttachArgs) -> anyhow::Result<()> {
    let config = args.driver_config()?;
    let driver = Slirp4netnsParent::new(config)?;

    let caps = detect_capabilities(&driver.config().binary)?;
    driver.config().check_capabilities(&caps)?;

    let state_dir = args.state_dir.unwrap_or_else(default_state_dir);
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("creating state directory {}", state_dir.display()))?;

    let running = interrupt_flag()?;
    let configured = driver
        .configure_network(args.pid, &state_dir)
        .map_err(rootnet_core::driver::ConfigureError::cleanup_and_into_error)?;
    tracing::info!(pid = args.pid, device = %configured.message.dev, "network attached");
    let result = super::print_json(&configured.message).map(|()| wait_for_interrupt(&running));

    tracing::info!(pid = args.pid, "detaching network");
    configured.cleanup.run()?;
    result
}

/// Installs the Ctrl+C and `SIGTERM` handler; the flag clears on signal.
fn interrupt_flag() -> anyhow::Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;
    Ok(running)
}

fn wait_for_interrupt(running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(250));
    }
}
