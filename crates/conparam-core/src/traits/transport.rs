// # Transport Trait
//
// Defines the datagram channel between a client and its backend.
//
// ## Implementations
//
// - UDP: `transport::UdpTransport`
// - Tests: scripted in-memory transports
//
// ## Usage
//
// ```rust,ignore
// use conparam_core::traits::Transport;
//
// async fn pump(transport: &dyn Transport) -> conparam_core::Result<()> {
//     transport.send(br#"{"__namespace__": "default"}"#).await?;
//
//     let mut buf = [0u8; 1024];
//     match transport.recv(&mut buf).await? {
//         Some(len) => println!("got {} bytes", len),
//         None => println!("idle"),
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::SocketAddr;

/// Trait for datagram transports
///
/// A transport is bound to one backend address for its whole life. It is
/// used concurrently: the receive loop calls [`recv`](Transport::recv) while
/// any number of callers call [`send`](Transport::send), so implementations
/// must not serialize the two directions behind one lock.
///
/// # Delivery
///
/// Datagrams are best-effort. No acknowledgment, ordering or retry is
/// expected from an implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one datagram to the backend
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of bytes handed to the network
    /// - `Err(Error)`: Send failed or timed out
    async fn send(&self, payload: &[u8]) -> Result<usize, crate::Error>;

    /// Receive one datagram into `buf`
    ///
    /// Datagrams longer than `buf` are truncated.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(len))`: A datagram of `len` bytes was received
    /// - `Ok(None)`: The receive timeout elapsed with no data (idle)
    /// - `Err(Error)`: Transport failure
    async fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>, crate::Error>;

    /// The backend address every datagram is sent to
    fn backend(&self) -> SocketAddr;
}
