use std::io;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};
use plum_common::PlumError;
use tracing::debug;

/// How long a single `next()` on the raw socket may block.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

pub type EthernetChannel = (Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>);

pub fn probe_config() -> Config {
    Config {
        read_timeout: Some(READ_TIMEOUT),
        ..Default::default()
    }
}

/// Opens a raw layer 2 channel on `intf`. Needs root (or CAP_NET_RAW).
pub fn open_eth_channel<F>(intf: &NetworkInterface, cfg: &Config, channel_opener: F) -> Result<EthernetChannel, PlumError>
where
    F: FnOnce(&NetworkInterface, Config) -> io::Result<Channel>,
{
    let channel: Channel = channel_opener(intf, *cfg)
        .map_err(|e| PlumError::Interface(format!("opening a raw socket on {}: {e}", intf.name)))?;
    match channel {
        Channel::Ethernet(tx, rx) => {
            debug!("Raw channel open on {}", intf.name);
            Ok((tx, rx))
        }
        _ => Err(PlumError::Interface(format!("non-ethernet channel for {}", intf.name))),
    }
}

/// [`open_eth_channel`] with the real pnet backend.
pub fn open(intf: &NetworkInterface) -> Result<EthernetChannel, PlumError> {
    open_eth_channel(intf, &probe_config(), datalink::channel)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
