//! Scripted in-memory socket for engine tests.
//!
//! Every send is recorded and handed to a responder closure, whose replies are
//! queued for `recv_from`. With nothing queued `recv_from` pends forever, so
//! the engine's own timeouts decide when to give up (use a paused clock).

use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::transport::Datagram;

pub(crate) type Reply = (Vec<u8>, SocketAddr);
type Responder = Box<dyn Fn(&[u8], SocketAddrV4, usize) -> Vec<Reply> + Send + Sync>;

pub(crate) struct MockSocket {
    sent: Mutex<Vec<(Vec<u8>, SocketAddrV4)>>,
    responder: Responder,
    inbox_tx: mpsc::UnboundedSender<Reply>,
    inbox_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Reply>>,
}

impl MockSocket {
    /// `responder` gets each payload, its destination and its zero-based send index.
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&[u8], SocketAddrV4, usize) -> Vec<Reply> + Send + Sync + 'static,
    {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            sent: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            inbox_tx,
            inbox_rx: tokio::sync::Mutex::new(inbox_rx),
        }
    }

    pub(crate) fn silent() -> Self {
        Self::new(|_, _, _| Vec::new())
    }

    pub(crate) fn push(&self, payload: &[u8], from: SocketAddr) {
        let _ = self.inbox_tx.send((payload.to_vec(), from));
    }

    pub(crate) fn sent(&self) -> Vec<(Vec<u8>, SocketAddrV4)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Datagram for MockSocket {
    async fn send_to(&self, payload: &[u8], target: SocketAddrV4) -> io::Result<usize> {
        let index: usize = {
            let mut sent = self.sent.lock().unwrap();
            sent.push((payload.to_vec(), target));
            sent.len() - 1
        };
        for reply in (self.responder)(payload, target, index) {
            let _ = self.inbox_tx.send(reply);
        }
        Ok(payload.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut inbox = self.inbox_rx.lock().await;
        match inbox.recv().await {
            Some((payload, from)) => {
                let len = payload.len().min(buf.len());
                buf[..len].copy_from_slice(&payload[..len]);
                Ok((len, from))
            }
            None => std::future::pending().await,
        }
    }
}
