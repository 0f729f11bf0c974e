//! LOOK / INFO datagrams of the post-reboot discovery agent.
//!
//! A LOOK query is broadcast; every device answers with an INFO datagram:
//! the `INFO` magic, four reserved bytes and a [`tlv`](crate::tlv) stream
//! describing itself (`MAC`, `ADDR`, ...).

use std::collections::HashMap;
use std::net::Ipv4Addr;

use plum_common::network::ip::parse_ipv4;
use plum_common::network::mac::parse_mac;
use pnet::util::MacAddr;

use crate::{PacketError, tlv};

pub const LOOK_MAGIC: &[u8; 4] = b"LOOK";
pub const INFO_MAGIC: &[u8; 4] = b"INFO";
pub const QUERY_LEN: usize = 18;
pub const INFO_HDR_LEN: usize = 8;

pub fn create_query() -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![0u8; QUERY_LEN];
    buffer[..LOOK_MAGIC.len()].copy_from_slice(LOOK_MAGIC);
    buffer
}

/// Builds an INFO answer. Devices send these; we only need it to stand in for one.
pub fn create_info<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(INFO_HDR_LEN);
    buffer.extend_from_slice(INFO_MAGIC);
    buffer.extend_from_slice(&[0u8; 4]);
    buffer.extend(tlv::encode(fields));
    buffer
}

/// Fields decoded from one INFO answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryRecord {
    fields: HashMap<String, String>,
}

impl DiscoveryRecord {
    pub fn parse(datagram: &[u8]) -> Result<Self, PacketError> {
        if datagram.len() <= INFO_HDR_LEN {
            return Err(PacketError::Truncated {
                what: "INFO datagram",
                needed: INFO_HDR_LEN + 1,
                got: datagram.len(),
            });
        }
        if &datagram[..INFO_MAGIC.len()] != INFO_MAGIC {
            return Err(PacketError::BadMagic("INFO"));
        }
        let fields = tlv::decode(&datagram[INFO_HDR_LEN..])?;
        Ok(Self { fields })
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(String::as_str)
    }

    pub fn mac(&self) -> Option<MacAddr> {
        self.get("MAC").and_then(|mac| parse_mac(mac).ok())
    }

    pub fn addr(&self) -> Option<Ipv4Addr> {
        self.get("ADDR").and_then(|addr| parse_ipv4(addr).ok())
    }

    /// Hardware addresses compare by value, so `AA:BB..` matches `aa:bb..`.
    pub fn is_from(&self, mac: MacAddr) -> bool {
        self.mac() == Some(mac)
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
