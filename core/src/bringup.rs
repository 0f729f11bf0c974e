//! # Console Bring-up
//!
//! The bootloader ignores ordinary traffic until it is interrupted. Each round
//! broadcasts the LUMP record (which also hands the device its MAC/IP
//! identity), gives the device a moment to apply it, then broadcasts a Ctrl-C
//! to the console port and listens for the prompt.
//!
//! Rounds repeat because the device may still be powering on: there is no
//! way to tell from here when its bootloader starts listening.

use std::net::SocketAddrV4;
use std::time::Duration;

use plum_common::{Context, Phase, PlumError, StopSignal, Target};
use plum_protocols::console::{self, ConsoleReply};
use plum_protocols::lump::BringupPacket;
use tokio::time::{self, Instant};
use tracing::{debug, info, info_span, trace, Instrument};

use crate::network::transport::{self, Datagram, Received, RECV_BUFFER_SIZE};

/// Time the device needs to apply the LUMP record before the interrupt.
const LUMP_SETTLE: Duration = Duration::from_millis(200);
/// How long each round listens for the prompt.
const PROMPT_WINDOW: Duration = Duration::from_secs(1);

pub struct BringupTransmitter<S> {
    socket: S,
    target: Target,
    iterations: u32,
    request_addr: SocketAddrV4,
    console_addr: SocketAddrV4,
    stop: StopSignal,
}

impl<S: Datagram> BringupTransmitter<S> {
    pub fn new(socket: S, ctx: &Context) -> Self {
        let target = ctx.target;
        Self {
            socket,
            target,
            iterations: ctx.config.bringup_iterations,
            request_addr: SocketAddrV4::new(target.broadcast, ctx.config.request_port),
            console_addr: SocketAddrV4::new(target.broadcast, ctx.config.console_port),
            stop: ctx.stop.clone(),
        }
    }

    /// `Ok(true)` once the console answered with its prompt from the target's
    /// address, `Ok(false)` when every round went unanswered. The socket is
    /// dropped on return either way.
    pub async fn bring_up(self) -> Result<bool, PlumError> {
        let span = info_span!("bring_up", target = %self.target);
        self.run().instrument(span).await
    }

    async fn run(self) -> Result<bool, PlumError> {
        debug!("Sending LUMP / Ctrl-C to {} for up to {} rounds", self.target.broadcast, self.iterations);

        for round in 1..=self.iterations {
            if self.stop.is_triggered() {
                return Err(PlumError::Cancelled { phase: Phase::BringUp });
            }

            let lump: Vec<u8> = BringupPacket::new(self.target.mac, self.target.ip).to_bytes();
            self.socket.send_to(&lump, self.request_addr).await?;
            time::sleep(LUMP_SETTLE).await;
            self.socket.send_to(console::INTERRUPT, self.console_addr).await?;

            if self.listen_for_prompt().await? {
                info!("Console answered after {round} round(s)");
                return Ok(true);
            }
            trace!("Round {round}: no prompt");
        }

        debug!("No prompt after {} rounds", self.iterations);
        Ok(false)
    }

    /// Drains the whole window; our own broadcast interrupt comes back too.
    async fn listen_for_prompt(&self) -> Result<bool, PlumError> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let deadline = Instant::now() + PROMPT_WINDOW;
        loop {
            let received = transport::recv_until(&self.socket, &mut buf, deadline).await?;
            let Received::Datagram { len, from } = received else {
                return Ok(false);
            };
            if !received.is_from(self.target.ip) {
                trace!("Ignoring {len} bytes from {from}");
                continue;
            }
            if console::classify(&buf[..len]) == ConsoleReply::Prompt {
                return Ok(true);
            }
        }
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
