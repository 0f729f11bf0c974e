//! Wire formats spoken by the bootloader and its discovery agent.
//!
//! Nothing in here touches a socket: every module turns typed values into
//! bytes and back, so the engines in `plum-core` can be exercised without a
//! device on the wire.

pub mod arp;
pub mod console;
pub mod discovery;
pub mod lump;
pub mod tlv;

use thiserror::Error;

/// Why a datagram could not be understood. The engines drop such datagrams
/// and keep waiting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("truncated {what}: need {needed} bytes, got {got}")]
    Truncated {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("expected a {expected} record, found {found}")]
    UnexpectedTag { expected: String, found: String },

    #[error("not a {0} datagram")]
    BadMagic(&'static str),

    #[error("{what} record is missing")]
    Missing { what: &'static str },

    #[error("buffer too small for {0}")]
    Buffer(&'static str),
}

/// Renders a four byte tag for messages, e.g. `IPS\0` → `"IPS"`.
pub(crate) fn tag_name(tag: &[u8]) -> String {
    String::from_utf8_lossy(tag)
        .trim_end_matches(['\0', ' '])
        .to_string()
}
