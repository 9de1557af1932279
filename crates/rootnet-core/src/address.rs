//! Address planning for the namespace side of the link.
//!
//! The helper hands out fixed host offsets inside its network: the
//! gateway at `+2`, the DNS forwarder at `+3` and, by convention, the
//! namespace itself at `+100`. The plan computed here must match those
//! offsets bit for bit.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use rootnet_common::constants::{
    DEFAULT_DNS, DEFAULT_GATEWAY, DEFAULT_IP, DEFAULT_NETMASK, HOST_OFFSET_DNS,
    HOST_OFFSET_GATEWAY, HOST_OFFSET_IP,
};
use rootnet_common::error::{Result, RootnetError};
use rootnet_common::types::{AddressPlan, Cidr};

/// Adds `offset` to `base` within its address family.
///
/// # Errors
///
/// Returns [`RootnetError::AddressComputation`] if the sum does not fit in
/// 32 bits (IPv4) or 128 bits (IPv6).
pub fn add_to_address(base: IpAddr, offset: u32) -> Result<IpAddr> {
    let overflow = || RootnetError::AddressComputation { base, offset };
    match base {
        IpAddr::V4(v4) => u32::from(v4)
            .checked_add(offset)
            .map(|n| IpAddr::V4(Ipv4Addr::from(n)))
            .ok_or_else(overflow),
        IpAddr::V6(v6) => u128::from(v6)
            .checked_add(u128::from(offset))
            .map(|n| IpAddr::V6(Ipv6Addr::from(n)))
            .ok_or_else(overflow),
    }
}

/// Derives the address plan for an optional explicit range.
///
/// Without a range the helper's built-in `10.0.2.0/24` network is assumed.
///
/// # Errors
///
/// Returns [`RootnetError::AddressComputation`] if any offset overflows
/// the range's address family.
pub fn plan_addresses(cidr: Option<&Cidr>) -> Result<AddressPlan> {
    let Some(cidr) = cidr else {
        return Ok(AddressPlan {
            ip: IpAddr::V4(DEFAULT_IP),
            netmask: DEFAULT_NETMASK,
            gateway: IpAddr::V4(DEFAULT_GATEWAY),
            dns: IpAddr::V4(DEFAULT_DNS),
        });
    };

    let base = cidr.network();
    Ok(AddressPlan {
        ip: add_to_address(base, HOST_OFFSET_IP)?,
        netmask: cidr.prefix(),
        gateway: add_to_address(base, HOST_OFFSET_GATEWAY)?,
        dns: add_to_address(base, HOST_OFFSET_DNS)?,
    })
}
