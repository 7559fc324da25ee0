// # Transport Implementations
//
// Implementations of the Transport trait.

pub mod udp;

pub use udp::UdpTransport;
