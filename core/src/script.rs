//! Scripted sessions.
//!
//! Commands run strictly one after another with a pause after each, because
//! the console corrupts input that arrives back to back. The first failing
//! command stops the script.

use std::io::Write;
use std::time::Duration;

use plum_common::{Context, Phase, PlumError, StopSignal};
use tokio::time;
use tracing::{info_span, warn, Instrument};

use crate::network::transport::Datagram;
use crate::session::{InvokeStatus, SessionEngine};

/// One command of a script and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the source file.
    pub number: usize,
    pub command: String,
}

/// Keeps the commands of a script file: trimmed, blank lines and `#` comments dropped.
pub fn parse_script(text: &str) -> Vec<ScriptLine> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| ScriptLine {
            number,
            command: line.to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEvent<'a> {
    Starting(&'a ScriptLine),
    Finished(&'a ScriptLine, InvokeStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptOutcome {
    pub commands_run: usize,
    /// The script ended the session with `exit`/`reset`.
    pub reset_sent: bool,
}

pub struct ScriptRunner<'s, S> {
    session: &'s mut SessionEngine<S>,
    pause: Duration,
    stop: StopSignal,
}

impl<'s, S: Datagram> ScriptRunner<'s, S> {
    pub fn new(session: &'s mut SessionEngine<S>, ctx: &Context) -> Self {
        Self {
            session,
            pause: ctx.config.command_pause,
            stop: ctx.stop.clone(),
        }
    }

    /// Runs `lines` in order. `on_event` sees every command before and after
    /// it runs; console output goes to `out`.
    pub async fn run<W, F>(&mut self, lines: &[ScriptLine], out: &mut W, on_event: F) -> Result<ScriptOutcome, PlumError>
    where
        W: Write,
        F: FnMut(ScriptEvent<'_>),
    {
        let span = info_span!("script", commands = lines.len());
        self.run_lines(lines, out, on_event).instrument(span).await
    }

    async fn run_lines<W, F>(&mut self, lines: &[ScriptLine], out: &mut W, mut on_event: F) -> Result<ScriptOutcome, PlumError>
    where
        W: Write,
        F: FnMut(ScriptEvent<'_>),
    {
        let mut outcome = ScriptOutcome::default();

        for line in lines {
            if self.stop.is_triggered() {
                return Err(PlumError::Cancelled { phase: Phase::Session });
            }

            on_event(ScriptEvent::Starting(line));
            let status = self
                .session
                .invoke(&line.command, out)
                .await
                .map_err(|e| PlumError::ScriptAborted {
                    line: line.number,
                    command: line.command.clone(),
                    source: Box::new(e),
                })?;
            outcome.commands_run += 1;
            on_event(ScriptEvent::Finished(line, status));

            if status.ends_session() {
                outcome.reset_sent = true;
                let skipped = lines.len() - outcome.commands_run;
                if skipped > 0 {
                    warn!("'{}' reset the device, skipping the last {skipped} command(s)", line.command);
                }
                break;
            }

            time::sleep(self.pause).await;
        }

        Ok(outcome)
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
