//! Embedded Demo Host
//!
//! Stands in for the real host process so the terminal surface runs on its
//! own. It owns the conversation and answers the demo tracks' actions:
//!
//! - `chat`: appends the prompt, streams an echo reply word by word through
//!   `partial_message`, then pushes the final history snapshot
//! - `clear`: empties the history
//! - `settings` / `home`: acknowledged, the renderer does the navigation
//!
//! Anything else is rejected, like a host with no matching handler.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use bridge_core::{
    ActionCall, ChatHistoryItem, HostEndpoint, HostEvent, HostRequest, NotifyLevel, SizeReport,
};

/// Delay between streamed words
const STREAM_INTERVAL: Duration = Duration::from_millis(60);

/// Model name announced at startup
const MODEL_NAME: &str = "echo-1";

/// In-process host that echoes prompts back
#[derive(Clone)]
pub struct DemoHost {
    events: mpsc::Sender<HostEvent>,
    history: Arc<Mutex<Vec<ChatHistoryItem>>>,
    last_size: Arc<Mutex<Option<SizeReport>>>,
    stream_interval: Duration,
}

impl DemoHost {
    /// Spawn the host on the endpoint's request channel
    pub fn spawn(endpoint: HostEndpoint) -> (Self, JoinHandle<()>) {
        Self::spawn_with_interval(endpoint, STREAM_INTERVAL)
    }

    /// Spawn with a custom streaming pace
    pub fn spawn_with_interval(
        endpoint: HostEndpoint,
        stream_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let HostEndpoint {
            mut requests,
            events,
        } = endpoint;

        let host = Self {
            events,
            history: Arc::new(Mutex::new(Vec::new())),
            last_size: Arc::new(Mutex::new(None)),
            stream_interval,
        };

        let worker = host.clone();
        let handle = tokio::spawn(async move {
            worker.announce().await;
            while let Some(request) = requests.recv().await {
                worker.handle(request);
            }
            tracing::debug!("Demo host stopped");
        });

        (host, handle)
    }

    /// Current conversation
    pub fn history(&self) -> Vec<ChatHistoryItem> {
        self.history.lock().clone()
    }

    /// Last size the renderer reported
    pub fn last_size(&self) -> Option<SizeReport> {
        *self.last_size.lock()
    }

    async fn announce(&self) {
        self.push(HostEvent::Track {
            track: "chat".to_string(),
            name: "model".to_string(),
            payload: json!({ "name": MODEL_NAME }),
        })
        .await;
    }

    fn handle(&self, request: HostRequest) {
        match request {
            HostRequest::Action { call, reply } => {
                tracing::debug!(action = %call.name, call_id = %call.id, "Demo host received action");
                let _ = reply.send(self.answer(call));
            }
            HostRequest::Size { size, reply } => {
                *self.last_size.lock() = Some(size);
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn answer(&self, call: ActionCall) -> Result<Value, String> {
        match call.name.as_str() {
            "chat" => {
                let text = prompt_text(&call.prompt);
                if text.trim().is_empty() {
                    return Err("Nothing to send".to_string());
                }
                let snapshot = {
                    let mut history = self.history.lock();
                    history.push(ChatHistoryItem::user(text.clone()));
                    history.clone()
                };
                let host = self.clone();
                tokio::spawn(async move { host.stream_reply(snapshot, text).await });
                Ok(json!({ "accepted": true }))
            }
            "clear" => {
                self.history.lock().clear();
                let host = self.clone();
                tokio::spawn(async move {
                    host.push(HostEvent::ChatHistory { items: Vec::new() }).await;
                    host.push(HostEvent::Notice {
                        level: NotifyLevel::Success,
                        title: None,
                        message: "Conversation cleared".to_string(),
                    })
                    .await;
                });
                Ok(Value::Null)
            }
            "settings" | "home" => Ok(Value::Null),
            other => Err(format!("No host handler for {other}")),
        }
    }

    async fn stream_reply(&self, snapshot: Vec<ChatHistoryItem>, text: String) {
        self.push(HostEvent::ChatHistory { items: snapshot }).await;

        let reply = format!("You said: {text}");
        let mut partial = String::new();
        let mut ticker = tokio::time::interval(self.stream_interval);

        for word in reply.split_inclusive(' ') {
            ticker.tick().await;
            partial.push_str(word);
            self.push(HostEvent::PartialMessage {
                text: Some(partial.clone()),
            })
            .await;
        }

        let items = {
            let mut history = self.history.lock();
            history.push(ChatHistoryItem::assistant(reply));
            history.clone()
        };
        self.push(HostEvent::ChatHistory { items }).await;
        self.push(HostEvent::PartialMessage { text: None }).await;
    }

    async fn push(&self, event: HostEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("Renderer gone, dropping host event");
        }
    }
}

impl std::fmt::Debug for DemoHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoHost")
            .field("history", &self.history.lock().len())
            .field("stream_interval", &self.stream_interval)
            .finish_non_exhaustive()
    }
}

/// Extract the prompt text (`{"text": ...}` or a bare string)
fn prompt_text(prompt: &Value) -> String {
    match prompt {
        Value::String(s) => s.clone(),
        other => other
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}
