mod commands;
mod terminal;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context as _;
use commands::{CommandLine, session, setup};
use plum_common::StopSignal;
use plum_core::script::{self, ScriptLine};
use terminal::{logging, print};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CommandLine::parse_args();

    logging::init_logging(args.debug);
    print::banner();

    let code = match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    };
    print::end_of_program();
    code
}

async fn run(args: &CommandLine) -> anyhow::Result<()> {
    let script: Option<Vec<ScriptLine>> = args.script.as_deref().map(load_script).transpose()?;

    let stop = StopSignal::new();
    spawn_interrupt_handler(stop.clone());

    let ctx = setup::prepare(args, stop).await?;
    session::bring_up(&ctx).await?;

    match script {
        Some(lines) => {
            let outcome = session::run_script(&ctx, &lines, args.progress).await?;
            if args.wait {
                if !outcome.reset_sent {
                    warn!("The script did not reset the device, waiting for it to reboot anyway");
                }
                session::wait_for_reboot(&ctx).await?;
            }
        }
        None => session::interactive(&ctx).await?,
    }
    Ok(())
}

fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptLine>> {
    let text: String = std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))?;
    let lines: Vec<ScriptLine> = script::parse_script(&text);
    if lines.is_empty() {
        warn!("{} has no commands", path.display());
    }
    Ok(lines)
}

fn spawn_interrupt_handler(stop: StopSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step");
            stop.trigger();
        }
    });
}
