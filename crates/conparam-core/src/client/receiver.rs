//! Background receive loop
//!
//! Pulls datagrams from the transport, decodes each one as a flat
//! name -> value object and merges it into the store. A single bad datagram
//! or transport error never ends the loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use super::SyncEvent;
use crate::error::Result;
use crate::store::ParameterStore;
use crate::traits::Transport;
use crate::wire;

/// State owned by the receive task
pub(crate) struct ReceiveLoop {
    transport: Arc<dyn Transport>,
    store: Arc<ParameterStore>,
    events: broadcast::Sender<SyncEvent>,
    buffer_size: usize,
    error_backoff: Duration,
}

impl ReceiveLoop {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        store: Arc<ParameterStore>,
        events: broadcast::Sender<SyncEvent>,
        buffer_size: usize,
        error_backoff: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            events,
            buffer_size,
            error_backoff,
        }
    }

    /// Run until the task is aborted or the process exits
    pub(crate) async fn run(self) {
        info!("Receive loop started for backend {}", self.transport.backend());

        let mut buf = vec![0u8; self.buffer_size];
        loop {
            match self.transport.recv(&mut buf).await {
                Ok(Some(len)) => {
                    if let Err(e) = self.handle_datagram(&buf[..len]).await {
                        warn!("Discarding malformed datagram ({} bytes): {}", len, e);
                        self.emit(SyncEvent::Discarded {
                            reason: e.to_string(),
                        });
                    }
                }
                Ok(None) => {
                    trace!("No data within receive timeout");
                }
                Err(e) => {
                    error!("Receive failed: {}", e);
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
    }

    /// Decode one datagram and merge it into the store
    ///
    /// # Returns
    ///
    /// - `Ok(names)`: Parameter names merged (empty if nothing was merged)
    /// - `Err(Error)`: The payload could not be decoded
    pub(crate) async fn handle_datagram(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let mut updates = wire::decode_update(bytes)?;

        if let Some(namespace) = updates.remove(wire::NAMESPACE_KEY) {
            debug!("Ignoring inbound {} = {}", wire::NAMESPACE_KEY, namespace);
        }

        if updates.is_empty() {
            debug!("Inbound datagram carried no parameters");
            self.emit(SyncEvent::Discarded {
                reason: "no parameters in datagram".to_string(),
            });
            return Ok(Vec::new());
        }

        let names: Vec<String> = updates.keys().cloned().collect();
        self.store.merge(updates).await;
        debug!("Merged {} parameter(s): {:?}", names.len(), names);

        self.emit(SyncEvent::Merged {
            names: names.clone(),
        });
        Ok(names)
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is the normal case
        let _ = self.events.send(event);
    }
}
