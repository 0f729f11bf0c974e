//! IPv4 parsing in the classic `inet_aton` spirit.
//!
//! Besides the usual dotted quad, operators paste addresses as one big
//! decimal, hex (`0xC0A80001`) or octal (`030052000001`) number, and dotted
//! components may themselves be hex or octal. Dotted components are limited
//! to one byte; the last one lands in the lowest octet.

use std::net::Ipv4Addr;

use crate::error::PlumError;

const MAX_DOTTED_PARTS: usize = 4;
/// Longest significant digit run that can still fit a `u32` in any radix we accept.
const MAX_SIGNIFICANT_DIGITS: usize = 11;

pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, PlumError> {
    let invalid = || PlumError::InvalidIpv4(s.to_string());
    let parts: Vec<&str> = s.split('.').collect();

    if parts.len() > MAX_DOTTED_PARTS {
        return Err(invalid());
    }

    if let [whole] = parts.as_slice() {
        let value: u64 = parse_component(whole).ok_or_else(invalid)?;
        let value: u32 = u32::try_from(value).map_err(|_| invalid())?;
        return Ok(Ipv4Addr::from(value));
    }

    let mut values: Vec<u8> = Vec::with_capacity(MAX_DOTTED_PARTS);
    for part in &parts {
        let value: u64 = parse_component(part).ok_or_else(invalid)?;
        let byte: u8 = u8::try_from(value).map_err(|_| invalid())?;
        values.push(byte);
    }

    let mut octets: [u8; 4] = [0; 4];
    let last: u8 = values.pop().ok_or_else(invalid)?;
    octets[..values.len()].copy_from_slice(&values);
    octets[3] = last;
    Ok(Ipv4Addr::from(octets))
}

pub fn is_valid_ipv4(s: &str) -> bool {
    parse_ipv4(s).is_ok()
}

fn parse_component(s: &str) -> Option<u64> {
    let (digits, radix): (&str, u32) =
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            (hex, 16)
        } else if s.len() > 1 && s.starts_with('0') {
            (&s[1..], 8)
        } else {
            (s, 10)
        };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let significant: &str = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Some(0);
    }
    if significant.len() > MAX_SIGNIFICANT_DIGITS {
        return None;
    }
    u64::from_str_radix(significant, radix).ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
