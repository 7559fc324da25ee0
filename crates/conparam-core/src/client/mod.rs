//! Parameter sync client
//!
//! The ParamClient is responsible for:
//! - Seeding the parameter store with defaults
//! - Announcing its namespace to the backend
//! - Running the background receive loop that merges inbound updates
//! - Forwarding local writes to the backend
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   get / set ───▶│ ParamClient  │──── {name: value} ────┐
//!                 └──────────────┘                       │
//!                        │                               ▼
//!                        ▼                        ┌─────────────┐
//!                ┌────────────────┐               │  Transport  │◀──▶ backend
//!                │ ParameterStore │◀── merge ─────│ ReceiveLoop │
//!                └────────────────┘               └─────────────┘
//! ```
//!
//! ## Write Flow
//!
//! 1. Upsert `(name, value)` into the store
//! 2. Encode `{name: value}` and send one datagram
//! 3. Log send failures; the local write stands either way

mod receiver;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, trace, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::store::ParameterStore;
use crate::traits::Transport;
use crate::transport::UdpTransport;
use crate::wire;

use receiver::ReceiveLoop;

/// Events emitted by the ParamClient
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// An inbound datagram was merged into the store
    Merged {
        names: Vec<String>,
    },

    /// An inbound datagram was dropped without touching the store
    Discarded {
        reason: String,
    },

    /// A local write was sent to the backend
    Forwarded {
        name: String,
    },

    /// A local write was stored but could not be sent
    ForwardFailed {
        name: String,
        error: String,
    },
}

/// Live parameter sync client
///
/// Mirrors the parameters of one namespace with a backend. Reads are served
/// from the local store; writes update the store and are forwarded to the
/// backend as fire-and-forget datagrams.
///
/// ## Lifecycle
///
/// 1. Create with [`ParamClient::connect()`]
/// 2. Share through an `Arc` with any number of tasks
/// 3. Dropping the client stops its receive loop
///
/// ## Example
///
/// ```rust,no_run
/// use conparam_core::{ClientConfig, ParamClient};
///
/// #[tokio::main]
/// async fn main() -> conparam_core::Result<()> {
///     let config = ClientConfig::new()
///         .with_namespace("test")
///         .with_default("param1", "value1")
///         .with_default("param2", 2);
///     let client = ParamClient::connect(config).await?;
///
///     let param2: i64 = client.get_as("param2").await?;
///     client.set("param2", param2 * 2).await?;
///     Ok(())
/// }
/// ```
pub struct ParamClient {
    /// Namespace announced at construction
    namespace: String,

    /// Destination of every outbound datagram
    backend: SocketAddr,

    /// Shared with the receive loop
    store: Arc<ParameterStore>,

    /// Shared with the receive loop
    transport: Arc<dyn Transport>,

    /// Largest payload that will be sent
    max_datagram_size: usize,

    /// Event sender for external monitoring
    events: broadcast::Sender<SyncEvent>,

    /// The single receive loop of this client
    receiver: JoinHandle<()>,
}

impl ParamClient {
    /// Connect to the backend over UDP
    ///
    /// Validates `config`, binds a UDP socket and hands over to
    /// [`with_transport`](Self::with_transport).
    ///
    /// Must be called from within a tokio runtime.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let transport = UdpTransport::bind(
            &config.backend.host,
            config.backend.port,
            config.timeout(),
        )
        .await?;

        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Create a client on top of an existing transport
    ///
    /// # Steps
    ///
    /// 1. Seed the store with `config.defaults`
    /// 2. Send the namespace announcement (best-effort)
    /// 3. Spawn the receive loop
    ///
    /// Must be called from within a tokio runtime.
    pub async fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(ParameterStore::with_defaults(config.defaults.clone()));
        let (events, _) = broadcast::channel(config.event_channel_capacity);
        let backend = transport.backend();

        let announcement = wire::encode_announcement(&config.namespace)?;
        match transport.send(&announcement).await {
            Ok(_) => info!(
                "Announced namespace '{}' to backend {}",
                config.namespace, backend
            ),
            Err(e) => warn!(
                "Failed to announce namespace '{}' to backend {}: {}",
                config.namespace, backend, e
            ),
        }

        let receive_loop = ReceiveLoop::new(
            transport.clone(),
            store.clone(),
            events.clone(),
            config.max_datagram_size,
            config.timeout(),
        );
        let receiver = tokio::spawn(receive_loop.run());

        Ok(Self {
            namespace: config.namespace,
            backend,
            store,
            transport,
            max_datagram_size: config.max_datagram_size,
            events,
            receiver,
        })
    }

    /// Get a parameter, waiting until it is known
    ///
    /// Returns immediately if the name was seeded or has already been set or
    /// received. Otherwise waits, without a deadline, until a local write or
    /// an inbound update introduces it. The reserved namespace key is never
    /// stored; use [`namespace`](Self::namespace) instead.
    pub async fn get(&self, name: &str) -> Value {
        trace!("Getting parameter {}", name);
        self.store.wait_for(name).await
    }

    /// Get a parameter, giving up after `timeout`
    ///
    /// # Errors
    ///
    /// [`Error::ParameterUnavailable`] if the name did not appear in time.
    pub async fn get_timeout(&self, name: &str, timeout: Duration) -> Result<Value> {
        tokio::time::timeout(timeout, self.get(name))
            .await
            .map_err(|_| Error::parameter_unavailable(name))
    }

    /// Get a parameter if it is already known
    pub async fn try_get(&self, name: &str) -> Option<Value> {
        self.store.get(name).await
    }

    /// Get a parameter as a concrete type, waiting until it is known
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if the current value does not deserialize into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.get(name).await;
        Ok(serde_json::from_value(value)?)
    }

    /// Set a parameter and forward it to the backend
    ///
    /// The local store is always updated. Forwarding is fire-and-forget:
    /// send failures are logged and reported as
    /// [`SyncEvent::ForwardFailed`], never returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`]: empty name
    /// - [`Error::ReservedName`]: the name is reserved by the protocol
    /// - [`Error::Json`]: the value cannot be represented as JSON
    pub async fn set<T: Serialize>(&self, name: &str, value: T) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_input("Parameter name cannot be empty"));
        }
        if wire::is_reserved(name) {
            return Err(Error::reserved_name(name));
        }

        let value = serde_json::to_value(value)?;
        let payload = wire::encode_update(name, &value)?;

        debug!("Setting parameter {} to {}", name, value);
        self.store.set(name, value).await;
        self.forward(name, &payload).await;

        Ok(())
    }

    /// The namespace this client announced
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The backend address all updates are sent to
    pub fn backend(&self) -> SocketAddr {
        self.backend
    }

    /// The parameter store shared with the receive loop
    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// Stream of sync events from this point on
    ///
    /// Subscribers that fall behind by more than the configured channel
    /// capacity skip the missed events.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = SyncEvent> + Send + 'static>> {
        let stream = BroadcastStream::new(self.events.subscribe()).filter_map(|event| event.ok());
        Box::pin(stream)
    }

    /// Send an encoded update, logging instead of failing
    async fn forward(&self, name: &str, payload: &[u8]) {
        if payload.len() > self.max_datagram_size {
            let error = Error::PayloadTooLarge {
                size: payload.len(),
                max: self.max_datagram_size,
            };
            warn!("Not sending parameter {} to backend {}: {}", name, self.backend, error);
            self.emit_forward_failed(name, &error);
            return;
        }

        match self.transport.send(payload).await {
            Ok(sent) => {
                debug!("Sent {} bytes for parameter {} to backend {}", sent, name, self.backend);
                self.emit(SyncEvent::Forwarded {
                    name: name.to_string(),
                });
            }
            Err(e) if e.is_timeout() => {
                warn!("Timed out sending parameter {} to backend {}: {}", name, self.backend, e);
                self.emit_forward_failed(name, &e);
            }
            Err(e) => {
                warn!("Failed to send parameter {} to backend {}: {}", name, self.backend, e);
                self.emit_forward_failed(name, &e);
            }
        }
    }

    fn emit_forward_failed(&self, name: &str, error: &Error) {
        self.emit(SyncEvent::ForwardFailed {
            name: name.to_string(),
            error: error.to_string(),
        });
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is the normal case
        let _ = self.events.send(event);
    }
}

impl Drop for ParamClient {
    fn drop(&mut self) {
        self.receiver.abort();
    }
}

impl std::fmt::Debug for ParamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamClient")
            .field("namespace", &self.namespace)
            .field("backend", &self.backend)
            .field("max_datagram_size", &self.max_datagram_size)
            .finish_non_exhaustive()
    }
}
