//! Transport Traits
//!
//! Outbound half of the renderer/host boundary. Pushed events travel the
//! other way on a plain channel (see [`crate::processor::EventPump`]).

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::events::{ActionCall, SizeReport};

/// Errors that can occur during transport operations
#[derive(Debug)]
pub enum TransportError {
    /// Connection was closed
    ConnectionClosed,
    /// Failed to send the request
    SendFailed(String),
    /// The host received the call and rejected it
    Rejected(String),
    /// Transport not in expected state
    InvalidState(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionClosed => write!(f, "Connection closed"),
            Self::SendFailed(msg) => write!(f, "Send failed: {msg}"),
            Self::Rejected(msg) => write!(f, "Host rejected call: {msg}"),
            Self::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Transport trait for the renderer side
///
/// Each call is an independent request/response; implementations must not
/// serialize unrelated calls behind each other.
#[async_trait]
pub trait HostTransport: Send + Sync {
    /// Invoke the host half of an action and wait for its result
    async fn invoke_action(&self, call: ActionCall) -> Result<Value, TransportError>;

    /// Report the renderer's layout size
    async fn report_size(&self, size: SizeReport) -> Result<(), TransportError>;
}
