//! Local interface introspection.
//!
//! Address discovery and bring-up both need the operator's side of the link:
//! which interface to put raw ARP frames on, our own IPv4/MAC, and the subnet
//! the device is going to join.

use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;
use tracing::debug;

#[cfg(target_os = "linux")]
use linux_impl::{is_physical, is_wireless};
#[cfg(not(target_os = "linux"))]
use fallback_impl::{is_physical, is_wireless};

use crate::error::PlumError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// The interface was filtered out as "not physical" by the provided logic.
    NotPhysical,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface does not support broadcast (required for ARP and LUMP).
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
    /// The interface has no private IPv4 address.
    NoValidLanIp,
}

/// Our end of the link the device is plugged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLink {
    pub name: String,
    pub mac: MacAddr,
    pub network: Ipv4Network,
}

impl LocalLink {
    pub fn ip(&self) -> Ipv4Addr {
        self.network.ip()
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.network.mask()
    }

    /// Directed broadcast of the subnet, i.e. `ip | !netmask`.
    pub fn broadcast(&self) -> Ipv4Addr {
        self.network.broadcast()
    }
}

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
    fn get_ipv4_range(&self) -> Option<Ipv4Network>;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| match ip {
                IpNetwork::V4(ipv4) => Some(*ipv4),
                IpNetwork::V6(_) => None,
            })
            .collect()
    }

    fn get_ipv4_range(&self) -> Option<Ipv4Network> {
        self.get_ipv4_nets()
            .into_iter()
            .find(|net| !net.ip().is_loopback())
    }
}

/// Resolves the interface to work on, by name or by picking the best LAN candidate.
pub fn resolve(name: Option<&str>) -> Result<(NetworkInterface, LocalLink), PlumError> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();

    let interface: NetworkInterface = match name {
        Some(name) => interfaces
            .into_iter()
            .find(|intf| intf.name == name)
            .ok_or_else(|| PlumError::Interface(format!("no interface named {name}, is it correct?")))?,
        None => select_lan_interface(interfaces, is_physical, is_wired).ok_or_else(|| {
            PlumError::Interface("no usable LAN interface found, pass one with --iface".into())
        })?,
    };

    let link: LocalLink = link_from_interface(&interface)?;
    debug!("Using {} at {} ({})", link.name, link.network, link.mac);
    Ok((interface, link))
}

pub fn link_from_interface(interface: &NetworkInterface) -> Result<LocalLink, PlumError> {
    let mac: MacAddr = interface
        .mac
        .filter(|mac| *mac != MacAddr::zero())
        .ok_or_else(|| PlumError::Interface(format!("{} has no hardware address", interface.name)))?;

    let network: Ipv4Network = interface
        .get_ipv4_range()
        .ok_or_else(|| PlumError::Interface(format!("{} has no IPv4 address", interface.name)))?;

    Ok(LocalLink {
        name: interface.name.clone(),
        mac,
        network,
    })
}

/// Best LAN candidate among `interfaces`: viable ones only, wired first.
pub fn select_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_physical: impl Fn(&NetworkInterface) -> bool,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    let viable: Vec<NetworkInterface> = interfaces
        .into_iter()
        .filter(|intf| is_viable_lan_interface(intf, &is_physical).is_ok())
        .collect();
    select_best_lan_interface(viable, is_wired)
}

fn is_viable_lan_interface(
    interface: &NetworkInterface,
    is_physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_loopback() || !is_physical(interface) {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    let has_valid_ip = interface.ips.iter().any(|net| match net {
        IpNetwork::V4(ipv4) => ipv4.ip().is_private(),
        IpNetwork::V6(_) => false,
    });
    if !has_valid_ip {
        return Err(ViabilityError::NoValidLanIp);
    }

    Ok(())
}

fn select_best_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    match interfaces.len() {
        0 => None,
        1 => interfaces.into_iter().next(),
        _ => {
            let wired: Option<usize> = interfaces.iter().position(|intf| is_wired(intf));
            interfaces.into_iter().nth(wired.unwrap_or(0))
        }
    }
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(not(target_os = "linux"))]
mod fallback_impl {
    use super::*;

    pub fn is_physical(_interface: &NetworkInterface) -> bool {
        true
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        interface.name.starts_with("wl")
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
