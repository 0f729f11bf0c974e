use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use plum_common::{Config, Context, Target};
use plum_core::network::transport;
use pnet::util::MacAddr;
use tokio::net::UdpSocket;

pub const DEVICE_MAC: MacAddr = MacAddr(0x00, 0xd0, 0x4b, 0x8c, 0x11, 0x22);

/// A socket standing in for one of the device's ports.
pub struct DevicePort {
    pub socket: Arc<UdpSocket>,
    pub port: u16,
}

impl DevicePort {
    pub async fn bind() -> Self {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = socket.local_addr().unwrap().port();
        Self {
            socket: Arc::new(socket),
            port,
        }
    }

    pub async fn recv(&self) -> (Vec<u8>, SocketAddr) {
        let mut buf = [0u8; 1024];
        let (len, from) = self.socket.recv_from(&mut buf).await.unwrap();
        (buf[..len].to_vec(), from)
    }

    pub async fn send(&self, payload: &[u8], to: SocketAddr) {
        self.socket.send_to(payload, to).await.unwrap();
    }
}

/// Our side: what the binary would bind, on an ephemeral port.
pub async fn engine_socket() -> UdpSocket {
    transport::bind_udp(0).await.unwrap()
}

/// Everything points at 127.0.0.1, with the fixed ports swapped for the
/// simulated ones.
pub fn loopback_context(console_port: u16, request_port: u16, response_port: u16) -> Context {
    let config = Config {
        console_port,
        request_port,
        response_port,
        bringup_iterations: 10,
        command_timeout: Duration::from_secs(5),
        command_pause: Duration::from_millis(300),
        discovery_broadcast: Ipv4Addr::LOCALHOST,
        ..Config::default()
    };
    let target = Target::new(DEVICE_MAC, Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST);
    Context::new(config, target)
}
