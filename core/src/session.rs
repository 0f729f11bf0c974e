//! # Console Session
//!
//! One command at a time against the netconsole. The console has no framing,
//! so a reply is delimited by the prompt coming back and nothing else. Before
//! any output it also echoes the command back in chunks of arbitrary size.
//!
//! Echo handling counts *datagrams*, one per byte that was sent: the first
//! `command.len() + 1` non-prompt datagrams are dropped as echo. This is
//! approximate when the echo arrives in multi-byte chunks, and is kept that
//! way because it is how the console has always been driven.

use std::io::Write;
use std::net::SocketAddrV4;
use std::time::Duration;

use plum_common::{Context, Phase, PlumError, StopSignal, Target};
use plum_protocols::console::{self, ConsoleReply};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::network::transport::{self, Datagram, Received, RECV_BUFFER_SIZE};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How an [`SessionEngine::invoke`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeStatus {
    /// Nothing was sent.
    Empty,
    /// `exit`/`reset` went out as a bootloader reset; the session is over.
    ResetSent,
    /// The console is back at its prompt.
    Prompt,
    /// The console stopped at the environment override question.
    Override,
}

impl InvokeStatus {
    pub fn ends_session(&self) -> bool {
        matches!(self, InvokeStatus::ResetSent)
    }
}

/// What one inbound datagram meant to the running command.
#[derive(Debug, PartialEq, Eq)]
enum Step<'a> {
    Echo,
    Output(&'a [u8]),
    Done(ConsoleReply),
}

/// Per-invoke bookkeeping, rebuilt for every command.
#[derive(Debug, Default)]
struct SessionState {
    echo_len: usize,
    echo_discarded: usize,
    reply: Vec<u8>,
    prompt_seen: bool,
}

impl SessionState {
    fn new(echo_len: usize) -> Self {
        Self {
            echo_len,
            ..Default::default()
        }
    }

    fn absorb<'a>(&mut self, payload: &'a [u8]) -> Step<'a> {
        match console::classify(payload) {
            reply @ (ConsoleReply::Prompt | ConsoleReply::OverridePrompt) => {
                self.prompt_seen = true;
                Step::Done(reply)
            }
            ConsoleReply::Output if self.echo_discarded < self.echo_len => {
                self.echo_discarded += 1;
                Step::Echo
            }
            ConsoleReply::Output => {
                self.reply.extend_from_slice(payload);
                Step::Output(payload)
            }
        }
    }
}

pub struct SessionEngine<S> {
    socket: S,
    target: Target,
    console_addr: SocketAddrV4,
    command_timeout: Duration,
    stop: StopSignal,
}

impl<S: Datagram> SessionEngine<S> {
    pub fn new(socket: S, ctx: &Context) -> Self {
        Self {
            socket,
            target: ctx.target,
            console_addr: SocketAddrV4::new(ctx.target.ip, ctx.config.console_port),
            command_timeout: ctx.config.command_timeout,
            stop: ctx.stop.clone(),
        }
    }

    /// Sends `command` and streams everything the console prints in reply
    /// into `out`, minus the echo, until the prompt comes back.
    ///
    /// A rejected command, a timeout and a socket failure are all errors that
    /// carry the command text. None of them is retried.
    pub async fn invoke<W: Write>(&mut self, command: &str, out: &mut W) -> Result<InvokeStatus, PlumError> {
        if command.is_empty() {
            return Ok(InvokeStatus::Empty);
        }

        if console::is_exit_command(command) {
            let reset = console::frame_command(console::RESET_COMMAND);
            self.send(command, &reset).await?;
            debug!("Sent reset, the session is over");
            return Ok(InvokeStatus::ResetSent);
        }

        self.discard_stale(command).await?;
        let framed: Vec<u8> = console::frame_command(command);
        self.send(command, &framed).await?;

        let mut state = SessionState::new(framed.len());
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let deadline = Instant::now() + self.command_timeout;
        let mut ending = ConsoleReply::Prompt;

        while !state.prompt_seen {
            if self.stop.is_triggered() {
                return Err(PlumError::Cancelled { phase: Phase::Session });
            }
            if Instant::now() >= deadline {
                return Err(PlumError::CommandTimeout { command: command.to_string() });
            }

            let received = transport::recv_within(&self.socket, &mut buf, POLL_INTERVAL)
                .await
                .map_err(|source| PlumError::Session {
                    command: command.to_string(),
                    source,
                })?;

            let Received::Datagram { len, from } = received else {
                continue;
            };
            if !received.is_from(self.target.ip) {
                trace!("Dropping {len} bytes from {from}");
                continue;
            }

            match state.absorb(&buf[..len]) {
                Step::Echo => {}
                Step::Output(bytes) => {
                    out.write_all(bytes)?;
                    out.flush()?;
                }
                Step::Done(reply) => ending = reply,
            }
        }

        if ending == ConsoleReply::OverridePrompt {
            out.write_all(console::OVERRIDE_PROMPT)?;
            out.write_all(b"\n")?;
            out.flush()?;
            return Ok(InvokeStatus::Override);
        }
        if console::is_unknown_command(&state.reply) {
            return Err(PlumError::UnknownCommand { command: command.to_string() });
        }
        Ok(InvokeStatus::Prompt)
    }

    /// Drops whatever is already queued, such as the late reply and prompt of
    /// a command that timed out. Anything waiting before the send is stale.
    async fn discard_stale(&self, command: &str) -> Result<(), PlumError> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        while let Received::Datagram { len, from } = transport::recv_within(&self.socket, &mut buf, Duration::ZERO)
            .await
            .map_err(|source| PlumError::Session {
                command: command.to_string(),
                source,
            })?
        {
            trace!("Discarding {len} stale bytes from {from}");
        }
        Ok(())
    }

    async fn send(&self, command: &str, payload: &[u8]) -> Result<(), PlumError> {
        self.socket
            .send_to(payload, self.console_addr)
            .await
            .map_err(|source| PlumError::Session {
                command: command.to_string(),
                source,
            })?;
        Ok(())
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
