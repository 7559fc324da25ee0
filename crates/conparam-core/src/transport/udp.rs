// # UDP Transport
//
// Connectionless socket bound to an ephemeral local port, sending to one
// fixed backend address.
//
// The socket is shared as-is between the receive loop and senders: tokio's
// `UdpSocket` supports concurrent `send_to` and `recv_from` through `&self`.

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::traits::Transport;

/// UDP transport to a single backend
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    backend: SocketAddr,
    timeout: Duration,
}

impl UdpTransport {
    /// Resolve the backend and bind a local socket
    ///
    /// The backend is resolved once. An IPv4 address is preferred over IPv6
    /// (see [`pick_backend`]). The local socket is bound in the same address
    /// family as the backend.
    ///
    /// # Parameters
    ///
    /// - `host`: Backend hostname or IP literal
    /// - `port`: Backend UDP port
    /// - `timeout`: Bound applied to every receive and send
    pub async fn bind(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let resolved: Vec<SocketAddr> = tokio::net::lookup_host((host, port)).await?.collect();
        let backend = pick_backend(&resolved)
            .ok_or_else(|| Error::config(format!("Backend {}:{} did not resolve", host, port)))?;

        let local: SocketAddr = match backend {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        debug!("Bound {} for backend {}", socket.local_addr()?, backend);

        Ok(Self {
            socket,
            backend,
            timeout,
        })
    }

    /// The local address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

/// Choose the backend address among resolver results
///
/// The first IPv4 address wins; IPv6 is used only when nothing resolved to
/// IPv4. Backends listen on IPv4, while resolvers often list `::1` first
/// for `localhost`.
pub fn pick_backend(resolved: &[SocketAddr]) -> Option<SocketAddr> {
    resolved
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| resolved.first())
        .copied()
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, payload: &[u8]) -> Result<usize> {
        match tokio::time::timeout(self.timeout, self.socket.send_to(payload, self.backend)).await
        {
            Ok(sent) => Ok(sent?),
            Err(_) => Err(Error::timeout(format!(
                "send to {} exceeded {:?}",
                self.backend, self.timeout
            ))),
        }
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        match tokio::time::timeout(self.timeout, self.socket.recv_from(buf)).await {
            Ok(Ok((len, from))) => {
                trace!("Received {} bytes from {}", len, from);
                Ok(Some(len))
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Ok(None),
        }
    }

    fn backend(&self) -> SocketAddr {
        self.backend
    }
}
