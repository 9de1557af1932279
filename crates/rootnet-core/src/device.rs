//! Virtual network device preparation inside a target namespace.
//!
//! The parent driver only needs "a tap named X exists and is up inside
//! the namespace of pid P". How that happens is behind [`DevicePreparer`].

use std::process::Command;

use rootnet_common::error::{Result, RootnetError};

use crate::cleanup::CleanupChain;

/// Creates a device inside the network namespace of a target process.
pub trait DevicePreparer: Send + Sync {
    /// Creates `device` in the namespace of `pid` and brings it up.
    ///
    /// Anything that must be released later is pushed onto `cleanup`,
    /// even when this call ultimately fails.
    ///
    /// # Errors
    ///
    /// Returns [`RootnetError::DevicePreparationFailed`] if the device
    /// cannot be created or brought up.
    fn prepare(&self, pid: u32, device: &str, cleanup: &mut CleanupChain) -> Result<()>;
}

/// Creates a tap device with `ip tuntap` run through `nsenter`.
///
/// The tap lives and dies with the namespace, so nothing is registered
/// for cleanup.
#[derive(Debug, Clone, Copy, Default)]
pub struct NsenterTapPreparer;

impl NsenterTapPreparer {
    /// `nsenter` invocations, in order, that create and raise `device`.
    #[must_use]
    pub fn commands(pid: u32, device: &str) -> Vec<Vec<String>> {
        let pid = pid.to_string();
        let nsenter = ["nsenter", "-t", pid.as_str(), "-n", "-m", "-U", "--preserve-credentials"];
        let ip_steps: [&[&str]; 2] = [
            &["ip", "tuntap", "add", "name", device, "mode", "tap"],
            &["ip", "link", "set", device, "up"],
        ];
        ip_steps
            .iter()
            .map(|step| {
                nsenter
                    .iter()
                    .chain(step.iter())
                    .map(|s| (*s).to_string())
                    .collect()
            })
            .collect()
    }
}

impl DevicePreparer for NsenterTapPreparer {
    fn prepare(&self, pid: u32, device: &str, _cleanup: &mut CleanupChain) -> Result<()> {
        tracing::debug!(pid, device, "preparing tap device");
        for argv in Self::commands(pid, device) {
            run_step(device, &argv)?;
        }
        tracing::info!(pid, device, "tap device ready");
        Ok(())
    }
}

fn run_step(device: &str, argv: &[String]) -> Result<()> {
    let failed = |reason: String| RootnetError::DevicePreparationFailed {
        device: device.to_string(),
        reason: format!("{}: {reason}", argv.join(" ")),
    };
    let Some((program, args)) = argv.split_first() else {
        return Ok(());
    };

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        return Err(failed(format!(
            "{}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}
