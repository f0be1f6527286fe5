//! Transport Layer for Renderer-Host Calls
//!
//! The renderer talks to the host through [`HostTransport`]. The wire
//! framing belongs to whichever transport implements the trait; the core
//! only sees typed calls and typed pushed events.
//!
//! - `InProcess`: Direct channel communication (embedded host, tests)

pub mod in_process;
pub mod traits;

pub use in_process::{HostEndpoint, HostRequest, InProcessTransport};
pub use traits::{HostTransport, TransportError};
