use std::future::Future;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// Where the forwarding worker writes datagrams.
pub trait DatagramSink: Send + 'static {
    /// Send one datagram. Partial sends are reported as errors.
    fn send(&mut self, datagram: &[u8]) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// Unconnected UDP socket sending every datagram to one destination.
pub struct UdpSink {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpSink {
    pub async fn bind(local: SocketAddr, destination: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        log::info!(
            "udp sink bound to {}, sending to {}",
            socket.local_addr()?,
            destination
        );
        Ok(Self {
            socket,
            destination,
        })
    }

    /// Bind an ephemeral port on the wildcard address matching the destination family.
    pub async fn to(destination: SocketAddr) -> std::io::Result<Self> {
        let local: SocketAddr = if destination.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        Self::bind(local, destination).await
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramSink for UdpSink {
    async fn send(&mut self, datagram: &[u8]) -> std::io::Result<()> {
        let n = self.socket.send_to(datagram, self.destination).await?;
        if n != datagram.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short send: {} of {} bytes", n, datagram.len()),
            ));
        }
        Ok(())
    }
}
