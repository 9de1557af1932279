//! Configuration model for the parent-side network driver.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BINARY, DEFAULT_MTU};
use crate::error::{Result, RootnetError};
use crate::types::{CapabilitySet, Cidr, HelperOption};

/// Settings a parent driver is constructed with.
///
/// Immutable once handed to a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Helper binary, either a bare name looked up on `PATH` or a path.
    pub binary: String,
    /// Link MTU. `0` selects [`DEFAULT_MTU`]; negative values are rejected.
    pub mtu: i32,
    /// Explicit address range for the link (`--cidr`).
    pub cidr: Option<Cidr>,
    /// Prohibit the namespace from reaching the host loopback.
    pub disable_host_loopback: bool,
    /// Control socket the helper should listen on (`--api-socket`).
    pub api_socket: Option<PathBuf>,
    /// Ask the helper to sandbox itself (`--create-sandbox`).
    pub create_sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            mtu: 0,
            cidr: None,
            disable_host_loopback: false,
            api_socket: None,
            create_sandbox: false,
        }
    }
}

impl DriverConfig {
    /// Creates a configuration for `binary` with everything else defaulted.
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file. Missing fields take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| RootnetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Sets the MTU.
    #[must_use]
    pub fn with_mtu(mut self, mtu: i32) -> Self {
        self.mtu = mtu;
        self
    }

    /// Sets the address range.
    #[must_use]
    pub fn with_cidr(mut self, cidr: Cidr) -> Self {
        self.cidr = Some(cidr);
        self
    }

    /// Enables or disables `--disable-host-loopback`.
    #[must_use]
    pub fn with_disable_host_loopback(mut self, enable: bool) -> Self {
        self.disable_host_loopback = enable;
        self
    }

    /// Sets the control socket path.
    #[must_use]
    pub fn with_api_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.api_socket = Some(path.into());
        self
    }

    /// Enables or disables `--create-sandbox`.
    #[must_use]
    pub fn with_create_sandbox(mut self, enable: bool) -> Self {
        self.create_sandbox = enable;
        self
    }

    /// Checks the invariants every driver relies on and returns the
    /// effective MTU.
    ///
    /// # Errors
    ///
    /// Returns [`RootnetError::ConfigValidation`] for an empty binary or a
    /// negative MTU.
    pub fn validate(&self) -> Result<u32> {
        if self.binary.is_empty() {
            return Err(RootnetError::ConfigValidation {
                message: "got empty helper binary".into(),
            });
        }
        match u32::try_from(self.mtu) {
            Ok(0) => Ok(DEFAULT_MTU),
            Ok(mtu) => Ok(mtu),
            Err(_) => Err(RootnetError::ConfigValidation {
                message: format!("got negative mtu {}", self.mtu),
            }),
        }
    }

    /// Returns whether this configuration asks for `option`.
    #[must_use]
    pub const fn requests(&self, option: HelperOption) -> bool {
        match option {
            HelperOption::DisableHostLoopback => self.disable_host_loopback,
            HelperOption::Cidr => self.cidr.is_some(),
            HelperOption::ApiSocket => self.api_socket.is_some(),
            HelperOption::CreateSandbox => self.create_sandbox,
        }
    }

    /// Checks that the helper understands every option this configuration
    /// asks for.
    ///
    /// # Errors
    ///
    /// Returns [`RootnetError::ConfigValidation`] naming the first
    /// unsupported option.
    pub fn check_capabilities(&self, caps: &CapabilitySet) -> Result<()> {
        match HelperOption::ALL
            .into_iter()
            .find(|&option| self.requests(option) && !caps.supports(option))
        {
            Some(option) => Err(RootnetError::ConfigValidation {
                message: format!("{} does not support {option}", self.binary),
            }),
            None => Ok(()),
        }
    }
}
