use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context as _, Result};
use tokio::net::UdpSocket;
use tokio::time::timeout;

const RECV_BUFFER_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub source: SocketAddr,
    pub payload: Vec<u8>,
}

/// Receive side of the bridge. `recv` must return within `wait`.
#[allow(async_fn_in_trait)]
pub trait DatagramSource {
    /// `Ok(None)` when nothing arrived in time.
    async fn recv(&mut self, wait: Duration) -> Result<Option<Datagram>>;

    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[derive(Debug)]
pub struct UdpSource {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpSource {
    pub async fn bind(port: u16) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .with_context(|| format!("failed to bind UDP port {port}"))?;

        Ok(Self {
            socket,
            buf: vec![0u8; RECV_BUFFER_LEN],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .context("failed to get UDP socket address")
    }
}

impl DatagramSource for UdpSource {
    async fn recv(&mut self, wait: Duration) -> Result<Option<Datagram>> {
        let Ok(received) = timeout(wait, self.socket.recv_from(&mut self.buf)).await else {
            return Ok(None);
        };
        let (len, source) = received.context("failed to receive UDP datagram")?;

        Ok(Some(Datagram {
            source,
            payload: self.buf[..len].to_vec(),
        }))
    }

    async fn close(self) -> Result<()> {
        drop(self.socket);
        Ok(())
    }
}
