// # conparam-core
//
// Live parameter synchronization client.
//
// ## Architecture Overview
//
// A process-local proxy mirrors named parameters of one namespace with a
// remote backend over UDP:
// - **ParameterStore**: Lock-guarded name -> value map shared by all tasks
// - **Transport**: Trait for the datagram channel to the backend
// - **ParamClient**: Announces the namespace, runs the receive loop, and
//   exposes blocking reads and fire-and-forget writes
// - **wire**: JSON-object-per-datagram codec
//
// ## Design Principles
//
// 1. **Local First**: Writes always land in the local store, whatever the network does
// 2. **Self-Healing**: The receive loop survives bad datagrams and transport errors
// 3. **No Polling**: Blocked reads wake on store mutations, not on a timer
// 4. **Library-First**: Everything is usable from any tokio application

pub mod client;
pub mod config;
pub mod error;
pub mod store;
pub mod traits;
pub mod transport;
pub mod wire;

// Re-export core types for convenience
pub use client::{ParamClient, SyncEvent};
pub use config::{BackendConfig, ClientConfig};
pub use error::{Error, Result};
pub use store::ParameterStore;
pub use traits::Transport;
pub use transport::UdpTransport;
