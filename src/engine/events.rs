// Knoux Engine Events
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Typed engine notifications fanned out over a tokio broadcast channel.
// Slow subscribers lose the oldest events rather than blocking the engine.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum EngineEvent {
    #[serde(rename = "video:playbackStateChanged")]
    PlaybackStateChanged {
        project_id: String,
        is_playing: bool,
    },
    #[serde(rename = "video:seeked")]
    Seeked { project_id: String, time: f64 },
    #[serde(rename = "timeline:clipAdded")]
    ClipAdded {
        project_id: String,
        track_id: String,
        clip_id: String,
    },
    #[serde(rename = "timeline:clipRemoved")]
    ClipRemoved { project_id: String, clip_id: String },
    #[serde(rename = "timeline:clipMoved")]
    ClipMoved {
        project_id: String,
        clip_id: String,
        track_id: String,
        time: f64,
    },
    #[serde(rename = "timeline:clipUpdated")]
    ClipUpdated {
        project_id: String,
        clip_id: String,
        property: String,
    },
    #[serde(rename = "ai:processingProgress")]
    ProcessingProgress { operation: String, progress: f64 },
    #[serde(rename = "ai:analysisComplete")]
    AnalysisComplete {
        operation: String,
        success: bool,
        result: Value,
    },
    #[serde(rename = "project:saved")]
    ProjectSaved { project_id: String, timestamp: i64 },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; having no listeners is not an error.
    pub fn emit(&self, event: EngineEvent) {
        trace!("[EVENTS] {:?}", event);
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
