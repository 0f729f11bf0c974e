use std::sync::OnceLock;

use mac_oui::Oui;
use pnet::util::MacAddr;

use crate::error::PlumError;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Retrieves or initializes the **Organizationally unique identifier** database.
fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB.get_or_init(|| Oui::default().ok()).as_ref()
}

/// Identify the vendor of a MAC address.
pub fn get_vendor(mac: MacAddr) -> Option<String> {
    let db = get_oui_db()?;
    match db.lookup_by_mac(&mac.to_string()) {
        Ok(Some(entry)) => Some(entry.company_name.clone()),
        _ => None,
    }
}

/// Parses a hardware address written as 12 hex digits.
///
/// Each pair of digits may be followed by a single colon, so both
/// `aa:bb:cc:dd:ee:ff` and `aabbccddeeff` are accepted. A trailing colon is not.
pub fn parse_mac(s: &str) -> Result<MacAddr, PlumError> {
    let invalid = || PlumError::InvalidMac(s.to_string());
    let bytes: &[u8] = s.as_bytes();
    let mut octets: [u8; 6] = [0; 6];
    let mut cursor: usize = 0;

    for (idx, octet) in octets.iter_mut().enumerate() {
        let pair: &[u8] = bytes.get(cursor..cursor + 2).ok_or_else(invalid)?;
        let pair: &str = std::str::from_utf8(pair).map_err(|_| invalid())?;
        if !pair.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        *octet = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        cursor += 2;

        let is_last: bool = idx == 5;
        if !is_last && bytes.get(cursor) == Some(&b':') {
            cursor += 1;
        }
    }

    if cursor != bytes.len() {
        return Err(invalid());
    }

    let [a, b, c, d, e, f] = octets;
    Ok(MacAddr::new(a, b, c, d, e, f))
}

pub fn is_valid_mac(s: &str) -> bool {
    parse_mac(s).is_ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
