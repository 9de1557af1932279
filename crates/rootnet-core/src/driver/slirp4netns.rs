//! `slirp4netns` backend.
//!
//! The parent prepares `tap0` in the target namespace, starts
//! `slirp4netns` against it and reports the addresses slirp4netns will
//! serve. The child side only checks that a device was named; the tap is
//! already up by the time the message arrives, and address and MTU setup
//! are left to the namespace's own networking code.

use std::path::Path;

use rootnet_common::config::DriverConfig;
use rootnet_common::constants::DEFAULT_DEVICE;
use rootnet_common::error::{Result, RootnetError};
use rootnet_common::types::{HelperOption, NetworkMessage};

use crate::address::plan_addresses;
use crate::cleanup::CleanupChain;
use crate::device::{DevicePreparer, NsenterTapPreparer};
use crate::driver::{ChildDriver, ConfigureError, Configured, ParentDriver};
use crate::process::Supervisor;

/// Arguments an optional switch contributes, or `None` when the
/// configuration does not ask for it.
fn option_args(option: HelperOption, config: &DriverConfig) -> Option<Vec<String>> {
    let flag = option.flag().to_string();
    match option {
        HelperOption::DisableHostLoopback => config.disable_host_loopback.then(|| vec![flag]),
        HelperOption::Cidr => config.cidr.map(|cidr| vec![flag, cidr.to_string()]),
        HelperOption::ApiSocket => config
            .api_socket
            .as_ref()
            .map(|path| vec![flag, path.display().to_string()]),
        HelperOption::CreateSandbox => config.create_sandbox.then(|| vec![flag]),
    }
}

/// Builds the full `slirp4netns` argument list.
///
/// `--mtu` always comes first, then every requested switch in
/// [`HelperOption::ALL`] order, then the pid and the device. Switches are
/// appended as configured; whether the helper supports them is checked by
/// [`DriverConfig::check_capabilities`] before the driver is built.
#[must_use]
pub fn helper_args(config: &DriverConfig, mtu: u32, pid: u32, device: &str) -> Vec<String> {
    let mut args = vec!["--mtu".to_string(), mtu.to_string()];
    args.extend(
        HelperOption::ALL
            .into_iter()
            .filter_map(|option| option_args(option, config))
            .flatten(),
    );
    args.push(pid.to_string());
    args.push(device.to_string());
    args
}

/// Parent driver that runs `slirp4netns`.
pub struct Slirp4netnsParent {
    config: DriverConfig,
    mtu: u32,
    preparer: Box<dyn DevicePreparer>,
}

impl Slirp4netnsParent {
    /// Validates `config` and builds a driver that prepares taps with
    /// [`NsenterTapPreparer`].
    ///
    /// Nothing is executed here; an invalid configuration is rejected
    /// before any process or device is touched.
    ///
    /// # Errors
    ///
    /// Returns [`RootnetError::ConfigValidation`] for an empty binary or a
    /// negative MTU.
    pub fn new(config: DriverConfig) -> Result<Self> {
        let mtu = config.validate()?;
        Ok(Self {
            config,
            mtu,
            preparer: Box::new(NsenterTapPreparer),
        })
    }

    /// Replaces the device preparation step.
    #[must_use]
    pub fn with_device_preparer(mut self, preparer: impl DevicePreparer + 'static) -> Self {
        self.preparer = Box::new(preparer);
        self
    }

    /// Configuration the driver was built with.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }
}

impl std::fmt::Debug for Slirp4netnsParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slirp4netnsParent")
            .field("config", &self.config)
            .field("mtu", &self.mtu)
            .finish_non_exhaustive()
    }
}

impl ParentDriver for Slirp4netnsParent {
    fn mtu(&self) -> u32 {
        self.mtu
    }

    fn configure_network(
        &self,
        pid: u32,
        state_dir: &Path,
    ) -> std::result::Result<Configured, ConfigureError> {
        let device = DEFAULT_DEVICE;
        let mut cleanup = CleanupChain::new();
        tracing::debug!(pid, device, state_dir = %state_dir.display(), "configuring slirp4netns network");

        if let Err(e) = self.preparer.prepare(pid, device, &mut cleanup) {
            return Err(ConfigureError::new(e, cleanup));
        }

        let supervisor = Supervisor::new(&self.config.binary)
            .args(helper_args(&self.config, self.mtu, pid, device))
            .bind_to_parent(true);
        let mut helper = match supervisor.spawn() {
            Ok(helper) => helper,
            Err(e) => return Err(ConfigureError::new(e, cleanup)),
        };
        cleanup.push("stop slirp4netns", move || {
            helper.shutdown();
            Ok(())
        });

        match plan_addresses(self.config.cidr.as_ref()) {
            Ok(plan) => Ok(Configured {
                message: NetworkMessage::new(device, self.mtu, plan),
                cleanup,
            }),
            Err(e) => Err(ConfigureError::new(e, cleanup)),
        }
    }
}

/// Child driver paired with [`Slirp4netnsParent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Slirp4netnsChild;

impl ChildDriver for Slirp4netnsChild {
    fn configure_network_child(&self, message: &NetworkMessage) -> Result<String> {
        if message.dev.is_empty() {
            return Err(RootnetError::MissingDevice);
        }
        Ok(message.dev.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(dev: &str) -> NetworkMessage {
        NetworkMessage::new(dev, 65520, plan_addresses(None).unwrap())
    }

    #[test]
    fn minimal_args() {
        let args = helper_args(&DriverConfig::default(), 65520, 1234, "tap0");
        assert_eq!(args, ["--mtu", "65520", "1234", "tap0"]);
    }

    #[test]
    fn all_options_in_fixed_order() {
        let config = DriverConfig::default()
            .with_create_sandbox(true)
            .with_api_socket("/run/user/1000/slirp.sock")
            .with_cidr("10.0.3.0/24".parse().unwrap())
            .with_disable_host_loopback(true);
        let args = helper_args(&config, 1500, 99, "tap0");
        assert_eq!(
            args,
            [
                "--mtu",
                "1500",
                "--disable-host-loopback",
                "--cidr",
                "10.0.3.0/24",
                "--api-socket",
                "/run/user/1000/slirp.sock",
                "--create-sandbox",
                "99",
                "tap0"
            ]
        );
    }

    #[test]
    fn single_option_between_mtu_and_positionals() {
        let config = DriverConfig::default().with_api_socket("/tmp/api.sock");
        let args = helper_args(&config, 65520, 7, "tap0");
        assert_eq!(args, ["--mtu", "65520", "--api-socket", "/tmp/api.sock", "7", "tap0"]);
    }

    #[test]
    fn zero_mtu_becomes_default() {
        let driver = Slirp4netnsParent::new(DriverConfig::default()).unwrap();
        assert_eq!(driver.mtu(), 65520);
    }

    #[test]
    fn explicit_mtu_is_kept() {
        let driver = Slirp4netnsParent::new(DriverConfig::default().with_mtu(1500)).unwrap();
        assert_eq!(driver.mtu(), 1500);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        assert!(matches!(
            Slirp4netnsParent::new(DriverConfig::new("")),
            Err(RootnetError::ConfigValidation { .. })
        ));
        assert!(matches!(
            Slirp4netnsParent::new(DriverConfig::default().with_mtu(-1500)),
            Err(RootnetError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn child_returns_device_unchanged() {
        assert_eq!(
            Slirp4netnsChild.configure_network_child(&message("tap0")).unwrap(),
            "tap0"
        );
    }

    #[test]
    fn child_rejects_missing_device() {
        let err = Slirp4netnsChild.configure_network_child(&message("")).unwrap_err();
        assert!(matches!(err, RootnetError::MissingDevice));
    }
}
