//! The datagram seam every UDP engine is written against.
//!
//! Engines are generic over [`Datagram`] so they run unchanged over a real
//! [`UdpSocket`] and over the scripted socket the unit tests use.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use plum_common::PlumError;
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};
use tracing::debug;

/// Largest datagram the console or the discovery agent ever sends.
pub const RECV_BUFFER_SIZE: usize = 1024;

#[async_trait]
pub trait Datagram: Send + Sync {
    async fn send_to(&self, payload: &[u8], target: SocketAddrV4) -> io::Result<usize>;
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

#[async_trait]
impl Datagram for UdpSocket {
    async fn send_to(&self, payload: &[u8], target: SocketAddrV4) -> io::Result<usize> {
        UdpSocket::send_to(self, payload, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }
}

#[async_trait]
impl<T: Datagram + ?Sized> Datagram for Arc<T> {
    async fn send_to(&self, payload: &[u8], target: SocketAddrV4) -> io::Result<usize> {
        (**self).send_to(payload, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        (**self).recv_from(buf).await
    }
}

/// Outcome of one bounded wait on a socket. Silence is an answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Datagram { len: usize, from: SocketAddr },
    Timeout,
}

impl Received {
    /// True when the datagram came from `ip`. Always false for [`Received::Timeout`].
    pub fn is_from(&self, ip: Ipv4Addr) -> bool {
        match self {
            Received::Datagram { from, .. } => from.ip() == ip,
            Received::Timeout => false,
        }
    }
}

/// Binds `0.0.0.0:port` with broadcast enabled. Port 0 picks an ephemeral port.
pub async fn bind_udp(port: u16) -> Result<UdpSocket, PlumError> {
    let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
        .await
        .map_err(|source| PlumError::Bind { port, source })?;
    socket.set_broadcast(true)?;
    debug!("Bound UDP port {port}");
    Ok(socket)
}

pub async fn recv_within<S>(socket: &S, buf: &mut [u8], wait: Duration) -> io::Result<Received>
where
    S: Datagram + ?Sized,
{
    recv_until(socket, buf, Instant::now() + wait).await
}

pub async fn recv_until<S>(socket: &S, buf: &mut [u8], deadline: Instant) -> io::Result<Received>
where
    S: Datagram + ?Sized,
{
    match time::timeout_at(deadline, socket.recv_from(buf)).await {
        Ok(Ok((len, from))) => Ok(Received::Datagram { len, from }),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(Received::Timeout),
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
