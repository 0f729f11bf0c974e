use std::net::Ipv4Addr;
use std::time::Duration;

use crate::network::target::Target;
use crate::signal::StopSignal;

pub const CONSOLE_PORT: u16 = 6666;
pub const REQUEST_PORT: u16 = 4446;
pub const RESPONSE_PORT: u16 = 4445;

/// Tunables for one run. Built once by the binary, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the bootloader netconsole listens and answers on.
    pub console_port: u16,
    /// Port the bring-up (LUMP) record is broadcast to.
    pub request_port: u16,
    /// Port used for LOOK queries and INFO answers.
    pub response_port: u16,
    /// Number of ~1.2s bring-up rounds before giving up.
    pub bringup_iterations: u32,
    /// Upper bound on how long a single command may wait for the prompt.
    pub command_timeout: Duration,
    /// Pause after every scripted command. The console drops input when rushed.
    pub command_pause: Duration,
    /// How long to let the device reboot before looking for it again.
    pub reboot_wait: Duration,
    /// Destination of discovery LOOK queries.
    pub discovery_broadcast: Ipv4Addr,
    /// How long an ARP probe waits for somebody to claim a candidate.
    pub arp_reply_wait: Duration,
    /// Cap on ARP probes before address discovery gives up.
    pub max_probe_attempts: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            console_port: CONSOLE_PORT,
            request_port: REQUEST_PORT,
            response_port: RESPONSE_PORT,
            bringup_iterations: 120,
            command_timeout: Duration::from_secs(120),
            command_pause: Duration::from_secs(1),
            reboot_wait: Duration::from_secs(7 * 60),
            discovery_broadcast: Ipv4Addr::BROADCAST,
            arp_reply_wait: Duration::from_millis(500),
            max_probe_attempts: 64,
        }
    }
}

/// What every engine needs to know about the run: tunables, the device and
/// the operator's stop flag.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub target: Target,
    pub stop: StopSignal,
}

impl Context {
    pub fn new(config: Config, target: Target) -> Self {
        Self {
            config,
            target,
            stop: StopSignal::new(),
        }
    }
}
