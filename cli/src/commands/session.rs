//! The device-facing half of a run: wake the console, drive it (scripted or
//! interactively), then optionally find the device again after its reboot.

use std::io::{self, BufRead, BufReader, Write};
use std::time::Duration;

use anyhow::{Context as _, bail};
use colored::*;
use plum_common::{Context, Phase, PlumError, StopSignal};
use plum_core::bringup::BringupTransmitter;
use plum_core::discovery::DiscoveryQuery;
use plum_core::network::transport;
use plum_core::script::{ScriptEvent, ScriptLine, ScriptOutcome, ScriptRunner};
use plum_core::session::SessionEngine;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::terminal::progress::ScriptProgress;
use crate::terminal::{colors, print};

const STOP_CHECK: Duration = Duration::from_secs(1);

pub async fn bring_up(ctx: &Context) -> anyhow::Result<()> {
    print::header("waking the console");
    info!("Please {} reboot the device {}", "HARD".red().bold(), "NOW".red().bold());

    let socket: UdpSocket = transport::bind_udp(ctx.config.console_port)
        .await
        .with_context(|| format!("{} for {}", Phase::BringUp, ctx.target))?;

    let awake: bool = BringupTransmitter::new(socket, ctx)
        .bring_up()
        .await
        .with_context(|| format!("{} for {}", Phase::BringUp, ctx.target))?;

    if !awake {
        bail!(
            "{}: no prompt from {} after {} rounds. Power-cycle the device and try again",
            Phase::BringUp,
            ctx.target,
            ctx.config.bringup_iterations
        );
    }
    info!("Console of {} is listening", ctx.target);
    Ok(())
}

async fn open_session(ctx: &Context) -> anyhow::Result<SessionEngine<UdpSocket>> {
    let socket: UdpSocket = transport::bind_udp(ctx.config.console_port)
        .await
        .with_context(|| format!("{} with {}", Phase::Session, ctx.target))?;
    Ok(SessionEngine::new(socket, ctx))
}

pub async fn run_script(ctx: &Context, lines: &[ScriptLine], show_progress: bool) -> anyhow::Result<ScriptOutcome> {
    print::header("running script");
    let mut session = open_session(ctx).await?;

    let progress: Option<ScriptProgress> = show_progress.then(|| ScriptProgress::start(lines.len()));
    let mut out: Box<dyn Write> = if show_progress {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout())
    };

    let outcome = ScriptRunner::new(&mut session, ctx)
        .run(lines, &mut out, |event| match (event, &progress) {
            (ScriptEvent::Starting(line), Some(bar)) => bar.running(&line.command),
            (ScriptEvent::Starting(line), None) => print::announce_command(&line.command),
            (ScriptEvent::Finished(..), Some(bar)) => bar.advance(),
            (ScriptEvent::Finished(..), None) => {}
        })
        .await
        .with_context(|| format!("{} with {}", Phase::Session, ctx.target))?;

    drop(progress);
    info!("Ran {} command(s)", outcome.commands_run);
    if outcome.reset_sent {
        info!("Reset sent, the device is rebooting");
    }
    Ok(outcome)
}

pub async fn interactive(ctx: &Context) -> anyhow::Result<()> {
    print::header("interactive shell");
    print::print_status(format!("{} or {} resets the device, Ctrl-D leaves it as is", "exit".color(colors::ACCENT), "reset".color(colors::ACCENT)));
    let mut session = open_session(ctx).await?;
    let mut stdin = spawn_line_reader(BufReader::new(io::stdin()));
    let mut stdout = io::stdout();

    loop {
        print::console_prompt();
        let line: Option<String> = tokio::select! {
            line = stdin.recv() => line.transpose().context("reading the next command")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };
        if ctx.stop.is_triggered() {
            break;
        }

        match session.invoke(line.trim(), &mut stdout).await {
            Ok(status) if status.ends_session() => {
                info!("Reset sent, the device is rebooting");
                break;
            }
            Ok(_) => {}
            Err(PlumError::Cancelled { .. }) => break,
            Err(e) => error!("{}: {e}", Phase::Session),
        }
    }
    Ok(())
}

/// Reads lines on a plain thread. A blocked terminal read cannot be cancelled,
/// so the runtime must not own it or shutdown would wait for the next Enter.
fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in reader.lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn wait_for_reboot(ctx: &Context) -> anyhow::Result<()> {
    print::header("waiting for the reboot");
    info!("Giving the device {}s to boot", ctx.config.reboot_wait.as_secs());
    sleep_unless_stopped(ctx.config.reboot_wait, &ctx.stop).await?;

    let socket: UdpSocket = transport::bind_udp(ctx.config.response_port)
        .await
        .with_context(|| format!("{} of {}", Phase::PostRebootDiscovery, ctx.target.mac))?;

    let found = DiscoveryQuery::new(socket, ctx)
        .find_ip_by_mac(ctx.target.mac, ctx.target.ip)
        .await
        .with_context(|| format!("{} of {}", Phase::PostRebootDiscovery, ctx.target.mac))?;

    match found {
        Some(ip) => info!("Your device is available at {}", ip.to_string().color(colors::ADDRESS)),
        None => warn!("Timeout: {} did not answer the discovery query", ctx.target.mac),
    }
    Ok(())
}

async fn sleep_unless_stopped(total: Duration, stop: &StopSignal) -> Result<(), PlumError> {
    let deadline = tokio::time::Instant::now() + total;
    while tokio::time::Instant::now() < deadline {
        if stop.is_triggered() {
            return Err(PlumError::Cancelled { phase: Phase::PostRebootDiscovery });
        }
        let left = deadline.saturating_duration_since(tokio::time::Instant::now());
        tokio::time::sleep(left.min(STOP_CHECK)).await;
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
