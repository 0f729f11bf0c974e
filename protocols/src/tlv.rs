//! Tag-length-value stream used by INFO discovery answers.
//!
//! Each entry is a four byte ASCII tag, a big-endian `u32` length and that
//! many value bytes. `INTF` and `IPV4` entries only open a section: they carry
//! a length but no value, so only their header is consumed.

use std::collections::HashMap;

use tracing::trace;

use crate::{PacketError, tag_name};

pub const TLV_HDR_LEN: usize = 8;
const SECTION_MARKERS: [&[u8; 4]; 2] = [b"INTF", b"IPV4"];
const PADDING: [char; 5] = [' ', '\t', '\r', '\n', '\0'];

pub fn decode(mut data: &[u8]) -> Result<HashMap<String, String>, PacketError> {
    let mut fields: HashMap<String, String> = HashMap::new();

    while !data.is_empty() {
        if data.len() < TLV_HDR_LEN {
            return Err(PacketError::Truncated {
                what: "TLV header",
                needed: TLV_HDR_LEN,
                got: data.len(),
            });
        }

        let tag: &[u8] = &data[..4];
        if SECTION_MARKERS.iter().any(|marker| &marker[..] == tag) {
            trace!("TLV section {}", tag_name(tag));
            data = &data[TLV_HDR_LEN..];
            continue;
        }

        let len: usize = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let end: usize = TLV_HDR_LEN.saturating_add(len);
        if data.len() < end {
            return Err(PacketError::Truncated {
                what: "TLV value",
                needed: end,
                got: data.len(),
            });
        }

        fields.insert(trimmed(tag), trimmed(&data[TLV_HDR_LEN..end]));
        data = &data[end..];
    }

    Ok(fields)
}

/// Encodes entries in order. Tags shorter than four bytes are NUL padded,
/// longer ones are cut.
pub fn encode<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::new();
    for (tag, value) in entries {
        let mut tag_bytes: [u8; 4] = [0; 4];
        let len: usize = tag.len().min(4);
        tag_bytes[..len].copy_from_slice(&tag.as_bytes()[..len]);

        buffer.extend_from_slice(&tag_bytes);
        buffer.extend_from_slice(&(value.len() as u32).to_be_bytes());
        buffer.extend_from_slice(value.as_bytes());
    }
    buffer
}

fn trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(PADDING)
        .to_string()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
