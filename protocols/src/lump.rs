//! The LUMP bring-up record.
//!
//! An IFF-style container: every chunk is a big-endian `u32` tag, a `u32`
//! body length and the body. The record assigns the device its temporary
//! address and doubles as the wake-up signal for the netconsole.
//!
//! ```text
//! LUMP 0x44
//!   MACD 0x10
//!     MAC@ 0x08  pad[2] mac_dest[6]
//!   IPS  0x0C
//!     IP@  0x04  ip_target[4]
//!   MACS 0x10
//!     MAC@ 0x08  pad[8]
//! ```

use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use crate::{PacketError, tag_name};

pub const LUMP: u32 = 0x4C55_4D50;
pub const MACD: u32 = 0x4D41_4344;
pub const MAC_ADDR: u32 = 0x4D41_4340;
pub const IPS: u32 = 0x4950_5300;
pub const IP_ADDR: u32 = 0x4950_4000;
pub const MACS: u32 = 0x4D41_4353;

pub const CHUNK_HDR_LEN: usize = 8;
const LUMP_BODY_LEN: u32 = 0x44;
const MACD_BODY_LEN: u32 = 0x10;
const IPS_BODY_LEN: u32 = 0x0C;
const MAC_FIELD_LEN: u32 = 0x08;
const IP_FIELD_LEN: u32 = 0x04;

/// Total size on the wire: the LUMP header plus its body.
pub const LUMP_RECORD_LEN: usize = CHUNK_HDR_LEN + LUMP_BODY_LEN as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupPacket {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl BringupPacket {
    pub fn new(mac: MacAddr, ip: Ipv4Addr) -> Self {
        Self { mac, ip }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer: Vec<u8> = Vec::with_capacity(LUMP_RECORD_LEN);

        put_header(&mut buffer, LUMP, LUMP_BODY_LEN);

        put_header(&mut buffer, MACD, MACD_BODY_LEN);
        put_header(&mut buffer, MAC_ADDR, MAC_FIELD_LEN);
        buffer.extend_from_slice(&[0u8; 2]);
        buffer.extend_from_slice(&mac_octets(self.mac));

        put_header(&mut buffer, IPS, IPS_BODY_LEN);
        put_header(&mut buffer, IP_ADDR, IP_FIELD_LEN);
        buffer.extend_from_slice(&self.ip.octets());

        // The source MAC is left blank. The device expects 8 bytes here, not 6.
        put_header(&mut buffer, MACS, MACD_BODY_LEN);
        put_header(&mut buffer, MAC_ADDR, MAC_FIELD_LEN);
        buffer.extend_from_slice(&[0u8; 8]);

        buffer
    }

    /// Reads a record back, recovering the destination MAC and the assigned IP.
    pub fn parse(bytes: &[u8]) -> Result<Self, PacketError> {
        let lump: Chunk = read_chunk(bytes)?;
        expect_tag(&lump, LUMP)?;

        let mut mac: Option<MacAddr> = None;
        let mut ip: Option<Ipv4Addr> = None;
        let mut body: &[u8] = lump.body;

        while !body.is_empty() {
            let chunk: Chunk = read_chunk(body)?;
            match chunk.tag {
                MACD => mac = Some(read_mac_field(chunk.body)?),
                IPS => ip = Some(read_ip_field(chunk.body)?),
                _ => {}
            }
            body = chunk.rest;
        }

        Ok(Self {
            mac: mac.ok_or(PacketError::Missing { what: "MACD" })?,
            ip: ip.ok_or(PacketError::Missing { what: "IPS" })?,
        })
    }
}

struct Chunk<'a> {
    tag: u32,
    body: &'a [u8],
    rest: &'a [u8],
}

fn put_header(buffer: &mut Vec<u8>, tag: u32, len: u32) {
    buffer.extend_from_slice(&tag.to_be_bytes());
    buffer.extend_from_slice(&len.to_be_bytes());
}

fn read_chunk(data: &[u8]) -> Result<Chunk<'_>, PacketError> {
    if data.len() < CHUNK_HDR_LEN {
        return Err(PacketError::Truncated {
            what: "LUMP chunk header",
            needed: CHUNK_HDR_LEN,
            got: data.len(),
        });
    }
    let tag: u32 = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let len: usize = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let end: usize = CHUNK_HDR_LEN.saturating_add(len);
    if data.len() < end {
        return Err(PacketError::Truncated {
            what: "LUMP chunk body",
            needed: end,
            got: data.len(),
        });
    }
    Ok(Chunk {
        tag,
        body: &data[CHUNK_HDR_LEN..end],
        rest: &data[end..],
    })
}

fn expect_tag(chunk: &Chunk<'_>, expected: u32) -> Result<(), PacketError> {
    if chunk.tag == expected {
        return Ok(());
    }
    Err(PacketError::UnexpectedTag {
        expected: tag_name(&expected.to_be_bytes()),
        found: tag_name(&chunk.tag.to_be_bytes()),
    })
}

fn read_mac_field(container: &[u8]) -> Result<MacAddr, PacketError> {
    let field: Chunk = read_chunk(container)?;
    expect_tag(&field, MAC_ADDR)?;
    match field.body {
        [_, _, a, b, c, d, e, f] => Ok(MacAddr::new(*a, *b, *c, *d, *e, *f)),
        other => Err(PacketError::Truncated {
            what: "MAC@ field",
            needed: MAC_FIELD_LEN as usize,
            got: other.len(),
        }),
    }
}

fn read_ip_field(container: &[u8]) -> Result<Ipv4Addr, PacketError> {
    let field: Chunk = read_chunk(container)?;
    expect_tag(&field, IP_ADDR)?;
    match field.body {
        [a, b, c, d] => Ok(Ipv4Addr::new(*a, *b, *c, *d)),
        other => Err(PacketError::Truncated {
            what: "IP@ field",
            needed: IP_FIELD_LEN as usize,
            got: other.len(),
        }),
    }
}

fn mac_octets(mac: MacAddr) -> [u8; 6] {
    let MacAddr(a, b, c, d, e, f) = mac;
    [a, b, c, d, e, f]
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
