//! Domain primitive types used across the rootnet workspace.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RootnetError};

/// Network address plus prefix length.
///
/// Host bits are cleared on construction, so `10.0.2.5/24` and
/// `10.0.2.0/24` describe the same range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    /// Creates a range from an address and a prefix length.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is longer than the address family.
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self> {
        let network = match addr {
            IpAddr::V4(v4) => {
                if prefix > 32 {
                    return Err(invalid_prefix(addr, prefix));
                }
                let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask))
            }
            IpAddr::V6(v6) => {
                if prefix > 128 {
                    return Err(invalid_prefix(addr, prefix));
                }
                let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & mask))
            }
        };
        Ok(Self { network, prefix })
    }

    /// Returns the network (base) address.
    #[must_use]
    pub const fn network(&self) -> IpAddr {
        self.network
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }
}

fn invalid_prefix(addr: IpAddr, prefix: u8) -> RootnetError {
    RootnetError::ConfigValidation {
        message: format!("prefix length {prefix} is too long for {addr}"),
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Cidr {
    type Err = RootnetError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RootnetError::ConfigValidation {
            message: format!("invalid CIDR {s:?}, expected <address>/<prefix>"),
        };
        let (addr, prefix) = s.split_once('/').ok_or_else(invalid)?;
        let addr: IpAddr = addr.trim().parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.trim().parse().map_err(|_| invalid())?;
        Self::new(addr, prefix)
    }
}

impl TryFrom<String> for Cidr {
    type Error = RootnetError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Cidr> for String {
    fn from(cidr: Cidr) -> Self {
        cidr.to_string()
    }
}

/// Optional switches understood by newer helper releases.
///
/// [`HelperOption::ALL`] lists them in the order they appear on the
/// helper's command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperOption {
    /// `--disable-host-loopback` (v0.3.0+).
    DisableHostLoopback,
    /// `--cidr` (v0.3.0+).
    Cidr,
    /// `--api-socket` (v0.3.0+).
    ApiSocket,
    /// `--create-sandbox` (v0.4.0+).
    CreateSandbox,
}

impl HelperOption {
    /// Every option, in command-line order.
    pub const ALL: [Self; 4] = [
        Self::DisableHostLoopback,
        Self::Cidr,
        Self::ApiSocket,
        Self::CreateSandbox,
    ];

    /// Returns the literal switch as printed by `--help`.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::DisableHostLoopback => "--disable-host-loopback",
            Self::Cidr => "--cidr",
            Self::ApiSocket => "--api-socket",
            Self::CreateSandbox => "--create-sandbox",
        }
    }
}

impl fmt::Display for HelperOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Which optional switches an installed helper understands.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Helper accepts `--cidr`.
    pub cidr: bool,
    /// Helper accepts `--disable-host-loopback`.
    pub disable_host_loopback: bool,
    /// Helper accepts `--api-socket`.
    pub api_socket: bool,
    /// Helper accepts `--create-sandbox`.
    pub create_sandbox: bool,
}

impl CapabilitySet {
    /// Derives the set from the helper's self-description.
    ///
    /// An option is supported iff its literal switch occurs anywhere in
    /// `text`. Formatting of the help output is irrelevant.
    #[must_use]
    pub fn from_help_text(text: &str) -> Self {
        let has = |option: HelperOption| text.contains(option.flag());
        Self {
            cidr: has(HelperOption::Cidr),
            disable_host_loopback: has(HelperOption::DisableHostLoopback),
            api_socket: has(HelperOption::ApiSocket),
            create_sandbox: has(HelperOption::CreateSandbox),
        }
    }

    /// Returns whether `option` is supported.
    #[must_use]
    pub const fn supports(&self, option: HelperOption) -> bool {
        match option {
            HelperOption::DisableHostLoopback => self.disable_host_loopback,
            HelperOption::Cidr => self.cidr,
            HelperOption::ApiSocket => self.api_socket,
            HelperOption::CreateSandbox => self.create_sandbox,
        }
    }
}

/// Addresses derived for the namespace side of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPlan {
    /// Address assigned to the device.
    pub ip: IpAddr,
    /// Prefix length of the link.
    pub netmask: u8,
    /// Default gateway.
    pub gateway: IpAddr,
    /// DNS forwarder.
    pub dns: IpAddr,
}

/// Everything the parent hands to the child namespace.
///
/// This is the only artifact that crosses the namespace boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMessage {
    /// Name of the device prepared inside the namespace.
    pub dev: String,
    /// Link MTU.
    pub mtu: u32,
    /// Address assigned to the device.
    pub ip: IpAddr,
    /// Prefix length of the link.
    pub netmask: u8,
    /// Default gateway.
    pub gateway: IpAddr,
    /// DNS forwarder.
    pub dns: IpAddr,
}

impl NetworkMessage {
    /// Combines a device, its MTU, and an address plan.
    #[must_use]
    pub fn new(dev: impl Into<String>, mtu: u32, plan: AddressPlan) -> Self {
        Self {
            dev: dev.into(),
            mtu,
            ip: plan.ip,
            netmask: plan.netmask,
            gateway: plan.gateway,
            dns: plan.dns,
        }
    }
}
