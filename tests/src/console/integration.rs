use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use plum_core::bringup::BringupTransmitter;
use plum_core::script::{self, ScriptRunner};
use plum_core::session::{InvokeStatus, SessionEngine};
use plum_protocols::console;
use plum_protocols::lump::{BringupPacket, LUMP_RECORD_LEN};
use tokio::sync::Mutex;

use crate::support::{DEVICE_MAC, DevicePort, engine_socket, loopback_context};

/// Echoes every command one byte per datagram, prints `output` and the prompt.
fn spawn_console(port: Arc<DevicePort>, output: &'static [u8], received: Arc<Mutex<Vec<(Vec<u8>, Instant)>>>) {
    tokio::spawn(async move {
        loop {
            let (command, from) = port.recv().await;
            received.lock().await.push((command.clone(), Instant::now()));
            for byte in &command {
                port.send(&[*byte], from).await;
            }
            port.send(output, from).await;
            port.send(console::PROMPT, from).await;
        }
    });
}

#[tokio::test]
async fn bring_up_succeeds_on_the_third_round() {
    let console_port = DevicePort::bind().await;
    let lump_port = DevicePort::bind().await;
    let ctx = loopback_context(console_port.port, lump_port.port, 0);

    let lumps = Arc::new(AtomicUsize::new(0));
    let lump_count = lumps.clone();
    tokio::spawn(async move {
        loop {
            let (record, _) = lump_port.recv().await;
            assert_eq!(record.len(), LUMP_RECORD_LEN);
            assert_eq!(
                BringupPacket::parse(&record).unwrap(),
                BringupPacket::new(DEVICE_MAC, std::net::Ipv4Addr::LOCALHOST)
            );
            lump_count.fetch_add(1, Ordering::SeqCst);
        }
    });

    let interrupts = Arc::new(AtomicUsize::new(0));
    let interrupt_count = interrupts.clone();
    tokio::spawn(async move {
        loop {
            let (payload, from) = console_port.recv().await;
            if payload == console::INTERRUPT && interrupt_count.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                console_port.send(console::PROMPT, from).await;
            }
        }
    });

    let awake = BringupTransmitter::new(engine_socket().await, &ctx).bring_up().await.unwrap();

    assert!(awake);
    assert_eq!(interrupts.load(Ordering::SeqCst), 3);
    assert_eq!(lumps.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn bring_up_fails_when_nobody_answers() {
    let console_port = DevicePort::bind().await;
    let lump_port = DevicePort::bind().await;
    let mut ctx = loopback_context(console_port.port, lump_port.port, 0);
    ctx.config.bringup_iterations = 2;

    let awake = BringupTransmitter::new(engine_socket().await, &ctx).bring_up().await.unwrap();

    assert!(!awake);
}

#[tokio::test]
async fn session_hides_the_echo_and_streams_output() {
    let console_port = Arc::new(DevicePort::bind().await);
    let ctx = loopback_context(console_port.port, 0, 0);
    let received = Arc::new(Mutex::new(Vec::new()));
    spawn_console(console_port, b"bootcmd=nand read 0x800000 0x200000\n", received.clone());

    let mut session = SessionEngine::new(engine_socket().await, &ctx);
    let mut out: Vec<u8> = Vec::new();
    let status = session.invoke("printenv bootcmd", &mut out).await.unwrap();

    assert_eq!(status, InvokeStatus::Prompt);
    assert_eq!(out, b"bootcmd=nand read 0x800000 0x200000\n".to_vec());
    assert_eq!(received.lock().await[0].0, b"printenv bootcmd\n".to_vec());
}

#[tokio::test]
async fn script_commands_are_paced() {
    let console_port = Arc::new(DevicePort::bind().await);
    let ctx = loopback_context(console_port.port, 0, 0);
    let received = Arc::new(Mutex::new(Vec::new()));
    spawn_console(console_port, b"OK\n", received.clone());

    let lines = script::parse_script("# reflash\nsetenv serverip 10.0.0.1\n\nsaveenv\nversion\n");
    let mut session = SessionEngine::new(engine_socket().await, &ctx);
    let mut out: Vec<u8> = Vec::new();

    let outcome = ScriptRunner::new(&mut session, &ctx)
        .run(&lines, &mut out, |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.commands_run, 3);
    assert_eq!(out, b"OK\nOK\nOK\n".to_vec());
    let received = received.lock().await;
    let commands: Vec<Vec<u8>> = received.iter().map(|(command, _)| command.clone()).collect();
    assert_eq!(
        commands,
        vec![b"setenv serverip 10.0.0.1\n".to_vec(), b"saveenv\n".to_vec(), b"version\n".to_vec()]
    );
    for pair in received.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(300));
    }
}

#[tokio::test]
async fn reset_is_fire_and_forget() {
    let console_port = DevicePort::bind().await;
    let ctx = loopback_context(console_port.port, 0, 0);
    let mut session = SessionEngine::new(engine_socket().await, &ctx);

    let status = session.invoke("exit", &mut Vec::new()).await.unwrap();

    assert_eq!(status, InvokeStatus::ResetSent);
    let (payload, _) = console_port.recv().await;
    assert_eq!(payload, b"reset\n".to_vec());
}
