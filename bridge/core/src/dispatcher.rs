//! Action Dispatcher
//!
//! Runs a named action: the renderer-side handler first (if any), then the
//! host-side counterpart over the transport. The host is always called;
//! there is no renderer-only action.
//!
//! # Ordering
//!
//! A synchronous local handler runs to completion before the remote call is
//! issued. An asynchronous one is polled once inline, so everything up to its
//! first pending await happens before the remote call; the rest is spawned
//! and not awaited, racing the host.
//!
//! # Cancellation
//!
//! Dropping the future returned by [`ActionDispatcher::execute`] stops
//! waiting for the host. The host may still complete the call.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;

use crate::actions::RendererHandler;
use crate::config::{BridgeConfig, LocalFailurePolicy};
use crate::context::BridgeContext;
use crate::error::ActionError;
use crate::events::{ActionCall, Prompt};
use crate::transport::HostTransport;

/// Dispatches actions for one session
#[derive(Clone)]
pub struct ActionDispatcher {
    ctx: BridgeContext,
    transport: Arc<dyn HostTransport>,
    action_timeout: Option<Duration>,
    on_local_handler_error: LocalFailurePolicy,
}

impl ActionDispatcher {
    /// Create a dispatcher using the given configuration
    pub fn new(ctx: BridgeContext, transport: Arc<dyn HostTransport>, config: &BridgeConfig) -> Self {
        Self {
            ctx,
            transport,
            action_timeout: config.action_timeout,
            on_local_handler_error: config.on_local_handler_error,
        }
    }

    /// Remote call timeout in effect
    #[must_use]
    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout
    }

    /// Run an action
    ///
    /// # Errors
    ///
    /// - [`ActionError::InvalidAction`] for an empty name, before anything else
    /// - [`ActionError::NotReady`] while tracks are loading or after close
    /// - [`ActionError::UnknownAction`] if nothing is registered under `name`
    /// - [`ActionError::LocalHandler`] if the local handler fails and the
    ///   policy is `abort`
    /// - [`ActionError::Remote`] / [`ActionError::Timeout`] from the host call
    pub async fn execute(
        &self,
        name: &str,
        prompt: Prompt,
        args: Vec<Value>,
    ) -> Result<Value, ActionError> {
        if name.trim().is_empty() {
            return Err(ActionError::InvalidAction);
        }

        let state = self.ctx.lifecycle();
        if !state.accepts_dispatch() {
            return Err(ActionError::NotReady { state });
        }

        let descriptor = self
            .ctx
            .actions()
            .get(name)
            .ok_or_else(|| ActionError::UnknownAction {
                name: name.to_string(),
            })?;

        if let Some(handler) = &descriptor.renderer_handler {
            self.run_local(name, handler, &prompt, &args)?;
        }

        let call = ActionCall::new(name, prompt, args);
        tracing::debug!(action = %name, call_id = %call.id, "Invoking host action");

        let remote = self.transport.invoke_action(call);
        let outcome = match self.action_timeout {
            Some(after) => tokio::time::timeout(after, remote).await.map_err(|_| {
                tracing::warn!(action = %name, timeout_ms = after.as_millis(), "Host action timed out");
                ActionError::Timeout {
                    name: name.to_string(),
                    after,
                }
            })?,
            None => remote.await,
        };

        outcome.map_err(|source| {
            tracing::warn!(action = %name, error = %source, "Host action failed");
            ActionError::Remote {
                name: name.to_string(),
                source,
            }
        })
    }

    fn run_local(
        &self,
        name: &str,
        handler: &RendererHandler,
        prompt: &Prompt,
        args: &[Value],
    ) -> Result<(), ActionError> {
        match handler {
            RendererHandler::Sync(f) => match f(prompt, args) {
                Ok(()) => Ok(()),
                Err(source) => match self.on_local_handler_error {
                    LocalFailurePolicy::Continue => {
                        tracing::warn!(action = %name, error = %source, "Local handler failed, calling host anyway");
                        Ok(())
                    }
                    LocalFailurePolicy::Abort => {
                        tracing::warn!(action = %name, error = %source, "Local handler failed, skipping host");
                        Err(ActionError::LocalHandler {
                            name: name.to_string(),
                            source,
                        })
                    }
                },
            },
            RendererHandler::Async(f) => {
                // First poll runs inline, up to the handler's first pending await
                let mut fut = f(prompt.clone(), args.to_vec());
                match (&mut fut).now_or_never() {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        tracing::warn!(action = %name, error = %e, "Async local handler failed");
                    }
                    None => {
                        let action = name.to_string();
                        tokio::spawn(async move {
                            if let Err(e) = fut.await {
                                tracing::warn!(action = %action, error = %e, "Async local handler failed");
                            }
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("action_timeout", &self.action_timeout)
            .field("on_local_handler_error", &self.on_local_handler_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::actions::ActionDescriptor;
    use crate::context::Lifecycle;
    use crate::events::SizeReport;
    use crate::transport::TransportError;

    /// Records every call; answers with a fixed result
    #[derive(Default)]
    struct RecordingHost {
        calls: Mutex<Vec<ActionCall>>,
        fail: bool,
        hang: bool,
    }

    #[async_trait]
    impl HostTransport for RecordingHost {
        async fn invoke_action(&self, call: ActionCall) -> Result<Value, TransportError> {
            self.calls.lock().push(call);
            if self.hang {
                futures::future::pending::<()>().await;
            }
            if self.fail {
                return Err(TransportError::Rejected("host said no".to_string()));
            }
            Ok(json!("ok"))
        }

        async fn report_size(&self, _size: SizeReport) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn ready_ctx(descriptors: Vec<ActionDescriptor>) -> BridgeContext {
        let ctx = BridgeContext::new();
        for d in descriptors {
            ctx.register_action(d).unwrap();
        }
        ctx.mark_ready();
        ctx
    }

    fn dispatcher(ctx: &BridgeContext, host: Arc<RecordingHost>) -> ActionDispatcher {
        ActionDispatcher::new(ctx.clone(), host, &BridgeConfig::default())
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_anything() {
        let host = Arc::new(RecordingHost::default());
        let ctx = BridgeContext::new();
        let result = dispatcher(&ctx, host.clone()).execute("", json!({}), vec![]).await;

        // Rejected for the name even though the context is still loading
        assert!(matches!(result, Err(ActionError::InvalidAction)));
        assert!(host.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_while_loading() {
        let host = Arc::new(RecordingHost::default());
        let ctx = BridgeContext::new();
        ctx.register_action(ActionDescriptor::new("chat")).unwrap();

        let result = dispatcher(&ctx, host.clone()).execute("chat", json!({}), vec![]).await;
        assert!(matches!(
            result,
            Err(ActionError::NotReady {
                state: Lifecycle::Loading
            })
        ));
        assert!(host.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_action_no_remote_call() {
        let host = Arc::new(RecordingHost::default());
        let ctx = ready_ctx(vec![]);

        let result = dispatcher(&ctx, host.clone())
            .execute("summarize", json!({}), vec![])
            .await;
        assert!(matches!(result, Err(ActionError::UnknownAction { ref name }) if name == "summarize"));
        assert!(host.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_remote_call_carries_payload() {
        let host = Arc::new(RecordingHost::default());
        let ctx = ready_ctx(vec![ActionDescriptor::new("chat")]);

        let value = dispatcher(&ctx, host.clone())
            .execute("chat", json!({ "text": "hi" }), vec![json!(1)])
            .await
            .unwrap();

        assert_eq!(value, json!("ok"));
        let calls = host.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "chat");
        assert_eq!(calls[0].prompt, json!({ "text": "hi" }));
        assert_eq!(calls[0].args, vec![json!(1)]);
    }

    #[tokio::test]
    async fn test_local_handler_runs_before_remote() {
        let host = Arc::new(RecordingHost::default());
        let seen_remote_calls = Arc::new(Mutex::new(Vec::new()));
        let observed_host = host.clone();
        let observed = seen_remote_calls.clone();

        let ctx = ready_ctx(vec![ActionDescriptor::new("chat").with_sync_handler(
            move |prompt, args| {
                observed.lock().push((observed_host.calls.lock().len(), prompt.clone(), args.len()));
                Ok(())
            },
        )]);

        dispatcher(&ctx, host.clone())
            .execute("chat", json!("p"), vec![json!("a")])
            .await
            .unwrap();

        // Handler saw zero remote calls, then exactly one remote call followed
        assert_eq!(*seen_remote_calls.lock(), vec![(0, json!("p"), 1)]);
        assert_eq!(host.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_handler_continue_policy() {
        let host = Arc::new(RecordingHost::default());
        let ctx = ready_ctx(vec![
            ActionDescriptor::new("chat").with_sync_handler(|_, _| anyhow::bail!("local boom"))
        ]);

        let result = dispatcher(&ctx, host.clone()).execute("chat", json!({}), vec![]).await;
        assert!(result.is_ok());
        assert_eq!(host.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_handler_abort_policy() {
        let host = Arc::new(RecordingHost::default());
        let ctx = ready_ctx(vec![
            ActionDescriptor::new("chat").with_sync_handler(|_, _| anyhow::bail!("local boom"))
        ]);
        let config = BridgeConfig::default().with_local_failure_policy(LocalFailurePolicy::Abort);

        let result = ActionDispatcher::new(ctx, host.clone(), &config)
            .execute("chat", json!({}), vec![])
            .await;
        assert!(matches!(result, Err(ActionError::LocalHandler { ref name, .. }) if name == "chat"));
        assert!(host.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_async_handler_spawned() {
        let host = Arc::new(RecordingHost::default());
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        let done_tx = Arc::new(Mutex::new(Some(done_tx)));

        let ctx = ready_ctx(vec![ActionDescriptor::new("chat").with_handler(
            RendererHandler::spawned(move |_, _| {
                let counter = counter.clone();
                let done_tx = done_tx.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if let Some(tx) = done_tx.lock().take() {
                        let _ = tx.send(());
                    }
                    Ok(())
                }
            }),
        )]);

        dispatcher(&ctx, host.clone())
            .execute("chat", json!({}), vec![])
            .await
            .unwrap();
        done_rx.await.unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(host.calls.lock().len(), 1);
    }

    /// Host that appends "remote" to a shared log
    struct OrderedHost {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl HostTransport for OrderedHost {
        async fn invoke_action(&self, _call: ActionCall) -> Result<Value, TransportError> {
            self.log.lock().push("remote");
            Ok(Value::Null)
        }

        async fn report_size(&self, _size: SizeReport) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_async_handler_starts_before_remote() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler_log = log.clone();
        let (resume_tx, resume_rx) = tokio::sync::oneshot::channel::<()>();
        let resume_rx = Arc::new(Mutex::new(Some(resume_rx)));

        let ctx = ready_ctx(vec![ActionDescriptor::new("chat").with_handler(
            RendererHandler::spawned(move |_, _| {
                let log = handler_log.clone();
                let resume = resume_rx.lock().take();
                async move {
                    log.lock().push("local");
                    if let Some(resume) = resume {
                        let _ = resume.await;
                    }
                    log.lock().push("local done");
                    Ok(())
                }
            }),
        )]);
        let host = Arc::new(OrderedHost { log: log.clone() });

        ActionDispatcher::new(ctx, host, &BridgeConfig::default())
            .execute("chat", json!({}), vec![])
            .await
            .unwrap();
        assert_eq!(*log.lock(), vec!["local", "remote"]);

        // The suspended remainder still runs on its own task
        resume_tx.send(()).unwrap();
        for _ in 0..100 {
            if log.lock().len() == 3 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(*log.lock(), vec!["local", "remote", "local done"]);
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let host = Arc::new(RecordingHost {
            fail: true,
            ..RecordingHost::default()
        });
        let ctx = ready_ctx(vec![ActionDescriptor::new("chat")]);

        let result = dispatcher(&ctx, host).execute("chat", json!({}), vec![]).await;
        assert!(matches!(
            result,
            Err(ActionError::Remote {
                source: TransportError::Rejected(_),
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_timeout() {
        let host = Arc::new(RecordingHost {
            hang: true,
            ..RecordingHost::default()
        });
        let ctx = ready_ctx(vec![ActionDescriptor::new("chat")]);
        let config = BridgeConfig::default().with_action_timeout_ms(100);

        let result = ActionDispatcher::new(ctx, host, &config)
            .execute("chat", json!({}), vec![])
            .await;
        assert!(matches!(
            result,
            Err(ActionError::Timeout { after, .. }) if after == Duration::from_millis(100)
        ));
    }

    #[tokio::test]
    async fn test_degraded_still_dispatches() {
        let host = Arc::new(RecordingHost::default());
        let ctx = BridgeContext::new();
        ctx.register_action(ActionDescriptor::new("chat")).unwrap();
        ctx.mark_degraded();

        assert!(dispatcher(&ctx, host).execute("chat", json!({}), vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_rejects() {
        let host = Arc::new(RecordingHost::default());
        let ctx = ready_ctx(vec![ActionDescriptor::new("chat")]);
        ctx.close();

        let result = dispatcher(&ctx, host).execute("chat", json!({}), vec![]).await;
        assert!(matches!(
            result,
            Err(ActionError::NotReady {
                state: Lifecycle::Closed
            })
        ));
    }
}
