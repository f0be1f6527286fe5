//! Track Loader
//!
//! Tracks are the pluggable units of renderer functionality. Each one is
//! built from the bridge context, initialized once, then dropped; whatever
//! it registered during `init` (actions, track event handlers) outlives it.
//!
//! Loading is strictly sequential and stops at the first failure. Earlier
//! tracks stay registered, and so does anything the failing track managed
//! to register before it failed.

use std::fmt;

use async_trait::async_trait;

use crate::context::BridgeContext;
use crate::error::TrackInitError;

/// A unit of renderer functionality
#[async_trait]
pub trait Track: Send {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Register actions and subscriptions
    async fn init(&mut self) -> anyhow::Result<()>;
}

/// Builds a track from the session context
pub type TrackConstructor = Box<dyn Fn(BridgeContext) -> Box<dyn Track> + Send + Sync>;

/// Outcome of a successful load
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Tracks whose `init` completed
    pub tracks_loaded: usize,
    /// Actions in the registry afterwards
    pub actions_registered: usize,
}

/// Ordered list of tracks to load
#[derive(Default)]
pub struct TrackLoader {
    constructors: Vec<TrackConstructor>,
}

impl TrackLoader {
    /// Create an empty loader
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track constructor
    #[must_use]
    pub fn with_track<F, T>(mut self, constructor: F) -> Self
    where
        F: Fn(BridgeContext) -> T + Send + Sync + 'static,
        T: Track + 'static,
    {
        self.constructors
            .push(Box::new(move |ctx| Box::new(constructor(ctx)) as Box<dyn Track>));
        self
    }

    /// Append an already boxed constructor
    pub fn push(&mut self, constructor: TrackConstructor) {
        self.constructors.push(constructor);
    }

    /// Number of tracks queued
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether no tracks are queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Construct and initialize every track in order
    ///
    /// Moves the context to `ready` on success and to `degraded` on failure;
    /// either way the action registry is sealed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`TrackInitError`] for the first track whose `init` fails.
    pub async fn load(&self, ctx: &BridgeContext) -> Result<LoadReport, TrackInitError> {
        tracing::info!(tracks = self.constructors.len(), "Loading tracks");

        for (index, constructor) in self.constructors.iter().enumerate() {
            let mut track = constructor(ctx.clone());
            let name = track.name().to_string();
            tracing::debug!(track = %name, index, "Initializing track");

            if let Err(source) = track.init().await {
                tracing::error!(track = %name, index, error = %source, "Track failed to initialize");
                ctx.mark_degraded();
                return Err(TrackInitError {
                    track: name,
                    index,
                    source,
                });
            }
        }

        ctx.mark_ready();
        Ok(LoadReport {
            tracks_loaded: self.constructors.len(),
            actions_registered: ctx.actions().len(),
        })
    }
}

impl fmt::Debug for TrackLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackLoader")
            .field("tracks", &self.constructors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actions::ActionDescriptor;
    use crate::context::Lifecycle;

    struct Probe {
        name: String,
        ctx: BridgeContext,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Track for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        async fn init(&mut self) -> anyhow::Result<()> {
            self.log.lock().push(format!("{}:start", self.name));
            tokio::task::yield_now().await;
            self.ctx
                .register_action(ActionDescriptor::new(format!("{}.run", self.name)))?;
            if self.fail {
                anyhow::bail!("{} cannot start", self.name);
            }
            self.log.lock().push(format!("{}:end", self.name));
            Ok(())
        }
    }

    fn logging_track(
        name: &'static str,
        fail: bool,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> impl Fn(BridgeContext) -> Probe + Send + Sync + 'static {
        let log = log.clone();
        move |ctx| Probe {
            name: name.to_string(),
            ctx,
            log: log.clone(),
            fail,
        }
    }

    #[tokio::test]
    async fn test_tracks_init_sequentially() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let loader = TrackLoader::new()
            .with_track(logging_track("a", false, &log))
            .with_track(logging_track("b", false, &log))
            .with_track(logging_track("c", false, &log));
        let ctx = BridgeContext::new();

        let report = loader.load(&ctx).await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"]
        );
        assert_eq!(
            report,
            LoadReport {
                tracks_loaded: 3,
                actions_registered: 3
            }
        );
        assert_eq!(ctx.lifecycle(), Lifecycle::Ready);
    }

    #[tokio::test]
    async fn test_failure_stops_later_tracks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let loader = TrackLoader::new()
            .with_track(logging_track("a", false, &log))
            .with_track(logging_track("b", true, &log))
            .with_track(logging_track("c", false, &log));
        let ctx = BridgeContext::new();

        let err = loader.load(&ctx).await.unwrap_err();

        assert_eq!(err.track, "b");
        assert_eq!(err.index, 1);
        assert_eq!(*log.lock(), vec!["a:start", "a:end", "b:start"]);
        // Registrations made before the failure are kept
        assert!(ctx.actions().has("a.run"));
        assert!(ctx.actions().has("b.run"));
        assert!(!ctx.actions().has("c.run"));
        assert_eq!(ctx.lifecycle(), Lifecycle::Degraded);
    }

    #[tokio::test]
    async fn test_empty_loader_is_ready() {
        let ctx = BridgeContext::new();
        let report = TrackLoader::new().load(&ctx).await.unwrap();
        assert_eq!(report, LoadReport::default());
        assert!(ctx.is_ready());
    }
}
