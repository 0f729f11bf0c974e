//! Post-reboot device lookup.
//!
//! The discovery agent on the device answers a broadcast `LOOK` with an `INFO`
//! datagram describing itself. We keep asking for a short, bounded number of
//! rounds and take the first answer carrying the target's MAC and an address
//! other than the one we already know.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use pnet::util::MacAddr;
use plum_common::{Context, Phase, PlumError, StopSignal};
use plum_protocols::discovery::{self, DiscoveryRecord};
use tokio::time::Instant;
use tracing::{debug, info_span, trace, Instrument};

use crate::network::transport::{self, Datagram, Received, RECV_BUFFER_SIZE};

const QUERY_ROUNDS: usize = 10;
const COLLECT_WINDOW: Duration = Duration::from_millis(50);

pub struct DiscoveryQuery<S> {
    socket: S,
    query_addr: SocketAddrV4,
    stop: StopSignal,
}

impl<S: Datagram> DiscoveryQuery<S> {
    /// `socket` should be bound to the response port; queries go to the
    /// configured broadcast address on that same port.
    pub fn new(socket: S, ctx: &Context) -> Self {
        Self {
            socket,
            query_addr: SocketAddrV4::new(ctx.config.discovery_broadcast, ctx.config.response_port),
            stop: ctx.stop.clone(),
        }
    }

    /// `Ok(None)` when no fresh answer turned up within the query rounds.
    pub async fn find_ip_by_mac(&self, mac: MacAddr, known_ip: Ipv4Addr) -> Result<Option<Ipv4Addr>, PlumError> {
        let span = info_span!("discovery", %mac);
        self.query(mac, known_ip).instrument(span).await
    }

    async fn query(&self, mac: MacAddr, known_ip: Ipv4Addr) -> Result<Option<Ipv4Addr>, PlumError> {
        let look: Vec<u8> = discovery::create_query();
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        for round in 1..=QUERY_ROUNDS {
            if self.stop.is_triggered() {
                return Err(PlumError::Cancelled { phase: Phase::PostRebootDiscovery });
            }

            self.socket.send_to(&look, self.query_addr).await?;
            let deadline = Instant::now() + COLLECT_WINDOW;

            while let Received::Datagram { len, from } = transport::recv_until(&self.socket, &mut buf, deadline).await? {
                let record = match DiscoveryRecord::parse(&buf[..len]) {
                    Ok(record) => record,
                    Err(e) => {
                        trace!("Dropping datagram from {from}: {e}");
                        continue;
                    }
                };
                if !record.is_from(mac) {
                    continue;
                }
                match record.addr() {
                    Some(ip) if ip == known_ip => trace!("Stale answer from {from}, still {ip}"),
                    Some(ip) => {
                        debug!("Found after {round} round(s) at {ip}");
                        return Ok(Some(ip));
                    }
                    None => trace!("Answer from {from} has no usable ADDR"),
                }
            }
        }

        Ok(None)
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
