//! Everything that has to be settled before the device is touched: the local
//! link, the target identity and the run configuration.

use anyhow::{Context as _, bail};
use colored::*;
use pnet::datalink::NetworkInterface;
use pnet::util::MacAddr;
use plum_common::network::interface::{self, LocalLink};
use plum_common::network::mac;
use plum_common::{Config, Context, Phase, StopSignal, Target};
use plum_core::prober::AddressProber;
use std::net::Ipv4Addr;
use tracing::{info, warn};

use crate::commands::CommandLine;
use crate::terminal::{colors, print};

pub async fn prepare(args: &CommandLine, stop: StopSignal) -> anyhow::Result<Context> {
    let mac: MacAddr = target_mac(args)?;
    let config: Config = args.to_config();

    let (intf, link) = interface::resolve(args.iface.as_deref()).context("looking up the local interface")?;

    let ip: Ipv4Addr = match args.ip {
        Some(ip) => ip,
        None => find_free_ip(intf, link.clone(), &config, &stop).await?,
    };

    let target = Target::new(mac, ip, link.broadcast());
    print_summary(&link, &target);

    Ok(Context { config, target, stop })
}

fn target_mac(args: &CommandLine) -> anyhow::Result<MacAddr> {
    let mac: MacAddr = args.mac.unwrap_or_else(MacAddr::zero);
    if mac != MacAddr::zero() {
        return Ok(mac);
    }
    if args.wait {
        bail!("--wait needs the device MAC (-m/--mac) to recognise it after the reboot, {mac} matches any device");
    }
    warn!("No MAC given: the first device to reboot will be caught");
    warn!("It may not be yours if several devices reboot at the same time");
    Ok(mac)
}

async fn find_free_ip(intf: NetworkInterface, link: LocalLink, config: &Config, stop: &StopSignal) -> anyhow::Result<Ipv4Addr> {
    if !is_root::is_root() {
        bail!("{}: raw ARP probing needs root, run with sudo or pass --ip", Phase::AddressDiscovery);
    }

    info!("Looking for a free address in {} on {}", link.network, link.name);
    let network = link.network;
    let name = link.name.clone();
    let config = config.clone();
    let stop = stop.clone();

    let found = tokio::task::spawn_blocking(move || {
        AddressProber::open(&intf, link, &config)?.find_free_ip(&stop)
    })
    .await
    .context("address discovery task panicked")?;

    found.with_context(|| format!("{} failed on {name} ({network})", Phase::AddressDiscovery))
}

fn print_summary(link: &LocalLink, target: &Target) {
    print::header("setup");
    print::aligned_line("Interface", link.name.as_str());
    print::aligned_line("Local IP", link.ip().to_string().color(colors::ADDRESS));

    let vendor: String = if target.catches_any_device() {
        "any device".to_string()
    } else {
        mac::get_vendor(target.mac).unwrap_or_else(|| "unknown vendor".to_string())
    };
    let target_mac: String = format!("{} ({})", target.mac.to_string().color(colors::MAC_ADDR), vendor.color(colors::VENDOR));
    print::aligned_line("Target MAC", target_mac);
    print::aligned_line("Target IP", target.ip.to_string().color(colors::ADDRESS));
    print::aligned_line("Broadcast", target.broadcast.to_string().color(colors::ADDRESS));
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
