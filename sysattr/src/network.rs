//! LAN addresses worth showing to a user.

use std::net::Ipv4Addr;

use crate::source::SnapshotSource;
use crate::types::{InterfaceKind, NetworkInterface};

// docker/compose bridges
const BRIDGE_PREFIX: &str = "br-";

/// IPv4 addresses of physical wired/wireless interfaces, in source order.
pub fn usable_ipv4(interfaces: &[NetworkInterface]) -> Vec<Ipv4Addr> {
    interfaces
        .iter()
        .filter(|i| !i.is_virtual)
        .filter(|i| matches!(i.kind, InterfaceKind::Wired | InterfaceKind::Wireless))
        .filter(|i| !i.name.starts_with(BRIDGE_PREFIX))
        .filter_map(|i| i.ipv4)
        .collect()
}

pub async fn ip_addresses(source: &dyn SnapshotSource) -> Vec<Ipv4Addr> {
    usable_ipv4(&source.network_interfaces().await)
}
