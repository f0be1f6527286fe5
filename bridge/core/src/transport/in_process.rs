//! In-Process Transport
//!
//! Direct channel-based communication for embedded mode, used when the host
//! runs inside the renderer process (demo host, tests).
//!
//! # Usage
//!
//! ```ignore
//! let (transport, event_rx, mut host) = InProcessTransport::new_pair();
//!
//! // Host side: answer calls and push events
//! tokio::spawn(async move {
//!     while let Some(request) = host.requests.recv().await {
//!         match request {
//!             HostRequest::Action { call, reply } => {
//!                 let _ = reply.send(Ok(serde_json::Value::Null));
//!             }
//!             HostRequest::Size { reply, .. } => {
//!                 let _ = reply.send(Ok(()));
//!             }
//!         }
//!     }
//! });
//!
//! // Renderer side: hand event_rx to the session, transport to the dispatcher
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::events::{ActionCall, SizeReport};
use crate::messages::HostEvent;

use super::traits::{HostTransport, TransportError};

const DEFAULT_CAPACITY: usize = 100;

/// A call waiting for the host's answer
#[derive(Debug)]
pub enum HostRequest {
    /// `action.mutate`
    Action {
        /// The call payload
        call: ActionCall,
        /// Reply channel (`Err` = host-side rejection)
        reply: oneshot::Sender<Result<Value, String>>,
    },
    /// `size.mutate`
    Size {
        /// Reported size
        size: SizeReport,
        /// Reply channel
        reply: oneshot::Sender<Result<(), String>>,
    },
}

/// Host side of an in-process pair
pub struct HostEndpoint {
    /// Calls issued by the renderer
    pub requests: mpsc::Receiver<HostRequest>,
    /// Pushes events to the renderer
    pub events: mpsc::Sender<HostEvent>,
}

impl HostEndpoint {
    /// Push an event to the renderer
    ///
    /// Returns false if the renderer has gone away.
    pub async fn push(&self, event: HostEvent) -> bool {
        self.events.send(event).await.is_ok()
    }
}

/// In-process transport using tokio channels
pub struct InProcessTransport {
    /// Channel to send calls to the host
    request_tx: mpsc::Sender<HostRequest>,
    /// Connection state
    connected: Arc<AtomicBool>,
}

impl InProcessTransport {
    /// Create a new in-process transport pair
    ///
    /// Returns:
    /// - `InProcessTransport`: renderer side, for the dispatcher
    /// - `mpsc::Receiver<HostEvent>`: pushed events, for the event pump
    /// - `HostEndpoint`: host side
    #[must_use]
    pub fn new_pair() -> (Self, mpsc::Receiver<HostEvent>, HostEndpoint) {
        Self::new_pair_with_capacity(DEFAULT_CAPACITY)
    }

    /// Create with custom channel capacity
    #[must_use]
    pub fn new_pair_with_capacity(
        capacity: usize,
    ) -> (Self, mpsc::Receiver<HostEvent>, HostEndpoint) {
        let (request_tx, request_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);

        let transport = Self {
            request_tx,
            connected: Arc::new(AtomicBool::new(true)),
        };
        let endpoint = HostEndpoint {
            requests: request_rx,
            events: event_tx,
        };

        (transport, event_rx, endpoint)
    }

    /// Stop issuing calls; pending calls are unaffected
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Check if currently connected
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.request_tx.is_closed()
    }

    async fn submit(&self, request: HostRequest) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::InvalidState(
                "Transport not connected".to_string(),
            ));
        }

        self.request_tx
            .send(request)
            .await
            .map_err(|_| TransportError::SendFailed("Channel closed".to_string()))
    }
}

#[async_trait]
impl HostTransport for InProcessTransport {
    async fn invoke_action(&self, call: ActionCall) -> Result<Value, TransportError> {
        let (reply, response) = oneshot::channel();
        self.submit(HostRequest::Action { call, reply }).await?;

        response
            .await
            .map_err(|_| TransportError::ConnectionClosed)?
            .map_err(TransportError::Rejected)
    }

    async fn report_size(&self, size: SizeReport) -> Result<(), TransportError> {
        let (reply, response) = oneshot::channel();
        self.submit(HostRequest::Size { size, reply }).await?;

        response
            .await
            .map_err(|_| TransportError::ConnectionClosed)?
            .map_err(TransportError::Rejected)
    }
}
