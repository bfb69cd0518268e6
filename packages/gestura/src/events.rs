use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use gesture_core::{FrameOutcome, HandTelemetry, TriggerKind};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum PipelineEvent {
    #[serde(rename = "FRAME_TELEMETRY")]
    FrameTelemetry(FrameTelemetryPayload),

    #[serde(rename = "STABLE_GESTURE_CHANGED")]
    StableGestureChanged(StableGestureChangedPayload),

    #[serde(rename = "ACTION_DISPATCHED")]
    ActionDispatched(ActionDispatchedPayload),
}

impl PipelineEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::FrameTelemetry(_) => "FRAME_TELEMETRY",
            PipelineEvent::StableGestureChanged(_) => "STABLE_GESTURE_CHANGED",
            PipelineEvent::ActionDispatched(_) => "ACTION_DISPATCHED",
        }
    }

    /// Splits one frame's outcome into events, telemetry first.
    pub fn from_outcome(seq: u64, outcome: &FrameOutcome) -> Vec<PipelineEvent> {
        let timestamp = Utc::now();
        let mut events = Vec::with_capacity(1 + outcome.changes.len() + outcome.actions.len());

        events.push(PipelineEvent::FrameTelemetry(FrameTelemetryPayload {
            seq,
            hands: outcome.hands.clone(),
            timestamp,
        }));
        events.extend(outcome.changes.iter().map(|change| {
            PipelineEvent::StableGestureChanged(StableGestureChangedPayload {
                seq,
                slot: change.slot,
                stable: change.stable.clone(),
                timestamp,
            })
        }));
        events.extend(outcome.actions.iter().map(|action| {
            PipelineEvent::ActionDispatched(ActionDispatchedPayload {
                seq,
                trigger: action.trigger.clone(),
                command: action.command.clone(),
                kind: action.kind,
                timestamp,
            })
        }));
        events
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameTelemetryPayload {
    pub seq: u64,
    pub hands: Vec<HandTelemetry>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StableGestureChangedPayload {
    pub seq: u64,
    pub slot: usize,
    pub stable: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionDispatchedPayload {
    pub seq: u64,
    pub trigger: String,
    pub command: String,
    pub kind: TriggerKind,
    pub timestamp: DateTime<Utc>,
}

pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
    event_count: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            event_count: AtomicU64::new(0),
        }
    }

    /// Never blocks; with no subscribers the event is dropped.
    pub fn publish(&self, event: PipelineEvent) {
        self.event_count.fetch_add(1, Ordering::Relaxed);
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => trace!(event_type, receivers, "event published"),
            Err(_) => trace!(event_type, "no subscribers for event"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            total_events: self.event_count(),
            subscriber_count: self.subscriber_count(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventBusStats {
    pub total_events: u64,
    pub subscriber_count: usize,
}

/// Writes every event as one JSON line until the bus closes. Lagging drops
/// the oldest events and keeps going.
pub fn spawn_json_lines<W>(
    mut receiver: broadcast::Receiver<PipelineEvent>,
    mut writer: W,
) -> JoinHandle<W>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let written = serde_json::to_writer(&mut writer, &event)
                        .map_err(std::io::Error::from)
                        .and_then(|()| writer.write_all(b"\n"))
                        .and_then(|()| writer.flush());
                    if let Err(err) = written {
                        warn!(error = %err, "telemetry writer failed, stopping");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "telemetry writer lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        writer
    })
}
