//! Size reporting
//!
//! Tells the host how large the rendered surface is. Sizes are rounded up
//! to whole units and a size equal to the last one sent is not re-sent.
//! Reports are serialized: the compare and the send happen under one lock,
//! so concurrent callers reach the host one at a time.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::events::SizeReport;
use crate::transport::{HostTransport, TransportError};

/// Reports surface size changes to the host
pub struct SizeReporter {
    transport: Arc<dyn HostTransport>,
    last: Mutex<Option<SizeReport>>,
}

impl SizeReporter {
    /// Create a reporter that has sent nothing yet
    pub fn new(transport: Arc<dyn HostTransport>) -> Self {
        Self {
            transport,
            last: Mutex::new(None),
        }
    }

    /// Last size the host accepted
    pub async fn last_reported(&self) -> Option<SizeReport> {
        *self.last.lock().await
    }

    /// Report a layout size
    ///
    /// Returns `Ok(false)` when the rounded size matches the last report and
    /// nothing was sent.
    ///
    /// # Errors
    ///
    /// Propagates the transport failure; the size is not recorded so the next
    /// call retries it.
    pub async fn report(&self, width: f64, height: f64) -> Result<bool, TransportError> {
        let size = SizeReport::from_layout(width, height);
        let mut last = self.last.lock().await;
        if *last == Some(size) {
            return Ok(false);
        }

        tracing::trace!(width = size.width, height = size.height, "Reporting size");
        self.transport.report_size(size).await?;
        *last = Some(size);
        Ok(true)
    }
}

impl std::fmt::Debug for SizeReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeReporter")
            .field("last", &self.last.try_lock().ok().map(|last| *last))
            .finish_non_exhaustive()
    }
}
