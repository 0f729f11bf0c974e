//! Literals of the bootloader netconsole.
//!
//! The console has no framing at all: no length, no delimiter, no request id.
//! A reply is over when one of the prompt literals below arrives as a
//! datagram of its own, compared byte for byte (mind the trailing space).

pub const PROMPT: &[u8] = b"Marvell>> ";
pub const OVERRIDE_PROMPT: &[u8] = b"Override Env parameters? (y/n)";
/// ASCII ETX, what Ctrl-C sends on a serial line.
pub const INTERRUPT: &[u8] = &[0x03];
pub const RESET_COMMAND: &str = "reset";
const EXIT_COMMANDS: [&str; 2] = ["exit", "reset"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleReply {
    Prompt,
    OverridePrompt,
    Output,
}

pub fn classify(payload: &[u8]) -> ConsoleReply {
    if payload == PROMPT {
        ConsoleReply::Prompt
    } else if payload == OVERRIDE_PROMPT {
        ConsoleReply::OverridePrompt
    } else {
        ConsoleReply::Output
    }
}

/// `exit` and `reset` both end the session with a bootloader reset.
pub fn is_exit_command(command: &str) -> bool {
    EXIT_COMMANDS.contains(&command)
}

/// Commands are terminated by a single line feed.
pub fn frame_command(command: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(command.len() + 1);
    buffer.extend_from_slice(command.as_bytes());
    buffer.push(b'\n');
    buffer
}

/// U-Boot answers an unknown verb with `Unknown command 'x' - try 'help'`.
pub fn is_unknown_command(reply: &[u8]) -> bool {
    let text = String::from_utf8_lossy(reply);
    text.contains("Unknown") && text.contains("command")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
