//! # Address Discovery
//!
//! Finds an IPv4 address nobody on the local subnet answers for, so it can be
//! handed to the device in the bring-up record.
//!
//! Candidates are drawn by randomizing the host bits of our own network. Each
//! one is announced with a broadcast ARP request; a reply claiming the
//! candidate means it is taken, silence for `arp_reply_wait` means it is free.
//!
//! This runs on a raw layer 2 socket and blocks the calling thread, so async
//! callers should move it to `spawn_blocking`.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use pnet::datalink::{DataLinkReceiver, DataLinkSender, NetworkInterface};
use pnet::ipnetwork::Ipv4Network;
use plum_common::network::interface::LocalLink;
use plum_common::{Config, Phase, PlumError, StopSignal};
use plum_protocols::arp;
use rand::Rng;
use tracing::{debug, info, trace};

use crate::network::channel::{self, EthernetChannel};

pub struct AddressProber {
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
    link: LocalLink,
    reply_wait: Duration,
    max_attempts: usize,
}

impl AddressProber {
    pub fn open(intf: &NetworkInterface, link: LocalLink, config: &Config) -> Result<Self, PlumError> {
        let eth_channel: EthernetChannel = channel::open(intf)?;
        Ok(Self::with_channel(eth_channel, link, config))
    }

    pub fn with_channel((tx, rx): EthernetChannel, link: LocalLink, config: &Config) -> Self {
        Self {
            tx,
            rx,
            link,
            reply_wait: config.arp_reply_wait,
            max_attempts: config.max_probe_attempts,
        }
    }

    /// Consumes the prober so the raw socket is closed whatever the outcome.
    pub fn find_free_ip(mut self, stop: &StopSignal) -> Result<Ipv4Addr, PlumError> {
        let network: Ipv4Network = self.link.network;
        if network.prefix() >= 31 {
            return Err(PlumError::NoUsableHost { network });
        }

        let mut rng = rand::rng();
        for attempt in 1..=self.max_attempts {
            if stop.is_triggered() {
                return Err(PlumError::Cancelled { phase: Phase::AddressDiscovery });
            }

            let candidate: Ipv4Addr = draw_candidate(network, &mut rng);
            if candidate == self.link.ip() {
                continue;
            }

            debug!("Probe {attempt}/{}: who has {candidate}?", self.max_attempts);
            if !self.is_claimed(candidate)? {
                info!("Nobody answered for {candidate}, using it");
                return Ok(candidate);
            }
        }

        Err(PlumError::AddressExhausted {
            network,
            attempts: self.max_attempts,
        })
    }

    fn is_claimed(&mut self, candidate: Ipv4Addr) -> Result<bool, PlumError> {
        let request: Vec<u8> = arp::create_request(self.link.mac, self.link.ip(), candidate)
            .map_err(|e| PlumError::Interface(e.to_string()))?;

        match self.tx.send_to(&request, None) {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(PlumError::Io(e)),
            None => {
                return Err(PlumError::Interface(format!("{} refused the ARP frame", self.link.name)));
            }
        }

        let deadline = Instant::now() + self.reply_wait;
        while deadline > Instant::now() {
            match self.rx.next() {
                Ok(frame) => {
                    if let Some((claimed, owner)) = arp::claimed_address(frame) {
                        if claimed == candidate {
                            debug!("{candidate} is taken by {owner}");
                            return Ok(true);
                        }
                    }
                }
                Err(e) => trace!("raw read: {e}"),
            }
        }
        Ok(false)
    }
}

/// Draws random host bits until the address is not reserved.
fn draw_candidate(network: Ipv4Network, rng: &mut impl Rng) -> Ipv4Addr {
    let mask = u32::from(network.mask());
    let base = u32::from(network.network());
    loop {
        let candidate = base | (rng.random::<u32>() & !mask);
        if !is_reserved(candidate, mask) {
            return Ipv4Addr::from(candidate);
        }
    }
}

/// The network and broadcast addresses, plus any address with a byte made only
/// of host bits that is 0x00 or 0xFF.
fn is_reserved(addr: u32, mask: u32) -> bool {
    let host_bits: u32 = !mask;
    let host: u32 = addr & host_bits;
    if host == 0 || host == host_bits {
        return true;
    }
    addr.to_be_bytes()
        .into_iter()
        .zip(host_bits.to_be_bytes())
        .any(|(byte, bits)| bits == 0xFF && (byte == 0x00 || byte == 0xFF))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
