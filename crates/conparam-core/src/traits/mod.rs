//! Core traits for the parameter sync client
//!
//! - [`Transport`]: Datagram channel to the backend

pub mod transport;

pub use transport::Transport;
