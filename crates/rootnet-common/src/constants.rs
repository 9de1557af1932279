//! System-wide constants and default paths.

use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Helper binary looked up on `PATH` when none is configured.
pub const DEFAULT_BINARY: &str = "slirp4netns";

/// MTU used when the configured value is the `0` sentinel.
pub const DEFAULT_MTU: u32 = 65520;

/// Name of the tap device prepared inside the target namespace.
pub const DEFAULT_DEVICE: &str = "tap0";

/// Flag that makes the helper describe its command line.
pub const HELP_FLAG: &str = "--help";

/// Host-part offset of the address assigned to the namespace.
pub const HOST_OFFSET_IP: u32 = 100;

/// Host-part offset of the gateway.
pub const HOST_OFFSET_GATEWAY: u32 = 2;

/// Host-part offset of the DNS forwarder.
pub const HOST_OFFSET_DNS: u32 = 3;

/// Address assigned to the namespace when no range is configured.
pub const DEFAULT_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 2, 100);

/// Prefix length used when no range is configured.
pub const DEFAULT_NETMASK: u8 = 24;

/// Gateway used when no range is configured.
pub const DEFAULT_GATEWAY: Ipv4Addr = Ipv4Addr::new(10, 0, 2, 2);

/// DNS forwarder used when no range is configured.
pub const DEFAULT_DNS: Ipv4Addr = Ipv4Addr::new(10, 0, 2, 3);

/// Application name used in CLI output.
pub const APP_NAME: &str = "rootnet";

/// Returns the default state directory for a session.
///
/// Prefers `$XDG_RUNTIME_DIR/rootnet`, then falls back to the system
/// temporary directory.
#[must_use]
pub fn default_state_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map_or_else(std::env::temp_dir, PathBuf::from)
        .join(APP_NAME)
}
