//! # Device Target Model
//!
//! The one device a run is aimed at. It is settled during setup (MAC from the
//! operator, IP from the operator or from address discovery, broadcast from
//! the local link) and never changes afterwards.

use std::fmt;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Hardware address the bring-up record is addressed to.
    pub mac: MacAddr,
    /// Address handed to the device and used for every console exchange.
    pub ip: Ipv4Addr,
    /// Where bring-up records and interrupts are broadcast.
    pub broadcast: Ipv4Addr,
}

impl Target {
    pub fn new(mac: MacAddr, ip: Ipv4Addr, broadcast: Ipv4Addr) -> Self {
        Self { mac, ip, broadcast }
    }

    /// With an all-zero MAC the first device that reboots answers, whoever it is.
    pub fn catches_any_device(&self) -> bool {
        self.mac == MacAddr::zero()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ip, self.mac)
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
