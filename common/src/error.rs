use std::fmt;
use std::io;

use pnet::ipnetwork::Ipv4Network;
use thiserror::Error;

/// The operator-facing stages of a run, used to name where something failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AddressDiscovery,
    BringUp,
    Session,
    PostRebootDiscovery,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            Phase::AddressDiscovery => "address discovery",
            Phase::BringUp => "bring-up",
            Phase::Session => "session",
            Phase::PostRebootDiscovery => "post-reboot discovery",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PlumError {
    /// A fixed port is held by someone else. Never retried.
    #[error("could not bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("no prompt after '{command}' before the command timeout")]
    CommandTimeout { command: String },

    #[error("the console rejected '{command}' as an unknown command")]
    UnknownCommand { command: String },

    #[error("network error while running '{command}': {source}")]
    Session {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("no free address found in {network} after {attempts} ARP probes")]
    AddressExhausted { network: Ipv4Network, attempts: usize },

    #[error("{network} has no assignable host addresses")]
    NoUsableHost { network: Ipv4Network },

    #[error("interface error: {0}")]
    Interface(String),

    #[error("invalid MAC address '{0}', expected 12 hex digits (aa:bb:cc:dd:ee:ff)")]
    InvalidMac(String),

    #[error("invalid IPv4 address '{0}'")]
    InvalidIpv4(String),

    #[error("{phase} cancelled by operator")]
    Cancelled { phase: Phase },

    #[error("script stopped at line {line} ('{command}')")]
    ScriptAborted {
        line: usize,
        command: String,
        #[source]
        source: Box<PlumError>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PlumError {
    /// True for failures the console reported itself, as opposed to transport trouble.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PlumError::UnknownCommand { .. })
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
