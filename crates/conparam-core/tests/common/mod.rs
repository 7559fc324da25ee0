//! Test doubles and common utilities for client contract tests
//!
//! - [`ScriptedTransport`]: in-memory transport fed by the test
//! - [`MockBackend`]: real UDP socket standing in for the backend

#![allow(dead_code)]

use conparam_core::error::{Error, Result};
use conparam_core::traits::Transport;
use conparam_core::{ClientConfig, SyncEvent};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};

/// Upper bound for anything a test waits on
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// What the next `recv()` on a [`ScriptedTransport`] yields
pub enum Inbound {
    Datagram(Vec<u8>),
    Failure(String),
}

/// A transport whose inbound side is driven by the test
pub struct ScriptedTransport {
    /// Sender for the test to inject inbound traffic
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    /// Receiver drained by the client's receive loop
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Inbound>>,
    /// Every payload passed to send(), in order
    sent: std::sync::Mutex<Vec<Vec<u8>>>,
    /// When set, send() fails with a timeout
    fail_sends: AtomicBool,
    /// Call counter for recv()
    recv_call_count: AtomicUsize,
    /// How long recv() waits before reporting idle
    idle: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            sent: std::sync::Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            recv_call_count: AtomicUsize::new(0),
            idle: Duration::from_millis(20),
        })
    }

    /// A transport whose sends all time out
    pub fn failing() -> Arc<Self> {
        let transport = Self::new();
        transport.set_fail_sends(true);
        transport
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Queue an inbound datagram
    pub fn inject(&self, bytes: impl Into<Vec<u8>>) {
        let _ = self.inbound_tx.send(Inbound::Datagram(bytes.into()));
    }

    /// Queue an inbound JSON datagram
    pub fn inject_json(&self, value: Value) {
        self.inject(serde_json::to_vec(&value).unwrap());
    }

    /// Queue a transport failure
    pub fn inject_failure(&self, message: &str) {
        let _ = self.inbound_tx.send(Inbound::Failure(message.to_string()));
    }

    /// Every payload sent so far, decoded as JSON
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|payload| serde_json::from_slice(payload).unwrap())
            .collect()
    }

    pub fn recv_call_count(&self) -> usize {
        self.recv_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, payload: &[u8]) -> Result<usize> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::timeout("scripted send timeout"));
        }
        self.sent.lock().unwrap().push(payload.to_vec());
        Ok(payload.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.recv_call_count.fetch_add(1, Ordering::SeqCst);

        let mut inbound = self.inbound_rx.lock().await;
        match tokio::time::timeout(self.idle, inbound.recv()).await {
            Ok(Some(Inbound::Datagram(bytes))) => {
                let len = bytes.len().min(buf.len());
                buf[..len].copy_from_slice(&bytes[..len]);
                Ok(Some(len))
            }
            Ok(Some(Inbound::Failure(message))) => Err(Error::Network(std::io::Error::other(
                message,
            ))),
            Ok(None) | Err(_) => Ok(None),
        }
    }

    fn backend(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 9165))
    }
}

/// A UDP socket on loopback playing the backend
pub struct MockBackend {
    socket: UdpSocket,
}

impl MockBackend {
    pub async fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Self { socket }
    }

    pub fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }

    /// Receive the next datagram as JSON, with its sender
    pub async fn recv_json(&self) -> (Value, SocketAddr) {
        let mut buf = [0u8; 2048];
        let (len, from) = tokio::time::timeout(TEST_DEADLINE, self.socket.recv_from(&mut buf))
            .await
            .expect("backend receives a datagram in time")
            .unwrap();
        (serde_json::from_slice(&buf[..len]).unwrap(), from)
    }

    /// Whether a datagram arrives within `wait`
    pub async fn has_pending(&self, wait: Duration) -> bool {
        let mut buf = [0u8; 2048];
        tokio::time::timeout(wait, self.socket.recv_from(&mut buf))
            .await
            .is_ok()
    }

    pub async fn send_json(&self, to: SocketAddr, value: Value) {
        let payload = serde_json::to_vec(&value).unwrap();
        self.socket.send_to(&payload, to).await.unwrap();
    }

    pub async fn send_raw(&self, to: SocketAddr, payload: &[u8]) {
        self.socket.send_to(payload, to).await.unwrap();
    }
}

/// Client configuration with a short socket timeout
pub fn test_config(namespace: &str) -> ClientConfig {
    ClientConfig::new()
        .with_namespace(namespace)
        .with_timeout(Duration::from_millis(50))
}

/// Wait for the first event matching `predicate`
pub async fn next_event_matching<S, F>(events: &mut S, mut predicate: F) -> SyncEvent
where
    S: Stream<Item = SyncEvent> + Unpin,
    F: FnMut(&SyncEvent) -> bool,
{
    tokio::time::timeout(TEST_DEADLINE, async {
        while let Some(event) = events.next().await {
            if predicate(&event) {
                return event;
            }
        }
        panic!("event stream ended");
    })
    .await
    .expect("matching event arrives in time")
}
