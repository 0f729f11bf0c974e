pub mod session;
pub mod setup;

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use plum_common::Config;
use plum_common::network::ip::parse_ipv4;
use plum_common::network::mac::parse_mac;
use pnet::util::MacAddr;

#[derive(Parser, Debug)]
#[command(name = "plum", version)]
#[command(about = "Takes over the U-Boot netconsole of a NAS to recover or reflash it.")]
pub struct CommandLine {
    /// Console commands to run instead of opening an interactive shell
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Hardware address of the device (aa:bb:cc:dd:ee:ff)
    #[arg(short, long, value_parser = parse_mac)]
    pub mac: Option<MacAddr>,

    /// Interface the device is reachable on [default: best LAN interface]
    #[arg(short, long)]
    pub iface: Option<String>,

    /// Address to give the device instead of probing for a free one
    #[arg(long, value_parser = parse_ipv4)]
    pub ip: Option<Ipv4Addr>,

    /// Show a progress bar instead of the console output
    #[arg(short, long, requires = "script")]
    pub progress: bool,

    /// Wait for the device to reboot after the script and report its new address
    #[arg(short, long, requires = "script")]
    pub wait: bool,

    /// Bring-up rounds (about 1.2s each) before giving up
    #[arg(short, long, value_name = "ROUNDS", default_value_t = 120)]
    pub timeout: u32,

    /// Seconds to wait for the prompt after each command
    #[arg(long, value_name = "SECONDS", default_value_t = 120)]
    pub command_timeout: u64,

    /// Output debugging information
    #[arg(short = 'D', long)]
    pub debug: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_config(&self) -> Config {
        Config {
            bringup_iterations: self.timeout,
            command_timeout: Duration::from_secs(self.command_timeout),
            ..Config::default()
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
