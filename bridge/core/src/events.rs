//! Renderer Calls
//!
//! Requests sent from the renderer to the host. Unlike [`HostEvent`]s these
//! are request/response: every call is independently awaitable.
//!
//! [`HostEvent`]: crate::messages::HostEvent

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Prompt payload attached to an action invocation
///
/// Opaque to the core; produced by the prompt input and interpreted by the
/// action's local handler and the host.
pub type Prompt = Value;

/// Identifier for one outbound call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(Uuid);

impl CallId {
    /// Generate a new unique call ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call_{}", self.0.simple())
    }
}

/// Remote half of an action invocation (`action.mutate`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    /// Call identifier, for log correlation
    pub id: CallId,
    /// Registered action name
    pub name: String,
    /// Prompt payload
    pub prompt: Prompt,
    /// Extra arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ActionCall {
    /// Create a call with a fresh ID
    pub fn new(name: impl Into<String>, prompt: Prompt, args: Vec<Value>) -> Self {
        Self {
            id: CallId::new(),
            name: name.into(),
            prompt,
            args,
        }
    }
}

/// Layout size report (`size.mutate`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeReport {
    /// Width in whole pixels/cells
    pub width: u32,
    /// Height in whole pixels/cells
    pub height: u32,
}

impl SizeReport {
    /// Create a size report
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Round fractional layout dimensions up to whole units
    ///
    /// Negative and NaN inputs clamp to zero.
    #[must_use]
    pub fn from_layout(width: f64, height: f64) -> Self {
        Self {
            width: ceil_dimension(width),
            height: ceil_dimension(height),
        }
    }
}

fn ceil_dimension(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value.ceil() as u32
    }
}
