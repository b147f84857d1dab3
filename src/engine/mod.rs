// Knoux Engine Module
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Project model, timeline editing, persistence and the event bus, tied
// together by `ProjectEngine`.

pub mod events;
pub mod project;
pub mod store;
pub mod timeline;

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

pub use events::{EngineEvent, EventBus};
pub use project::{Clip, ProjectState, Timeline};
pub use store::{ProjectStore, StoreError};
pub use timeline::{PlaybackCommand, TimelineError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Open projects kept in memory, backed by the store, with every mutation
/// announced on the event bus.
pub struct ProjectEngine {
    open: Mutex<HashMap<String, ProjectState>>,
    store: ProjectStore,
    events: EventBus,
}

impl ProjectEngine {
    pub fn new(store: ProjectStore, events: EventBus) -> Self {
        Self {
            open: Mutex::new(HashMap::new()),
            store,
            events,
        }
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn create(&self, name: &str) -> Result<ProjectState, EngineError> {
        let mut project = ProjectState::new(name);
        self.store.save(&mut project).await?;
        info!(project_id = %project.id, "[PROJECT] Created '{}'", name);
        self.open
            .lock()
            .await
            .insert(project.id.clone(), project.clone());
        Ok(project)
    }

    /// Stored project ids.
    pub async fn list(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.store.list().await?)
    }

    /// The open copy if there is one, else the stored document (which is
    /// then kept open).
    pub async fn get(&self, id: &str) -> Result<ProjectState, EngineError> {
        let mut open = self.open.lock().await;
        if let Some(p) = open.get(id) {
            return Ok(p.clone());
        }
        let project = self.store.load(id).await?;
        open.insert(id.to_string(), project.clone());
        Ok(project)
    }

    pub async fn save(&self, id: &str) -> Result<PathBuf, EngineError> {
        let mut open = self.open.lock().await;
        if !open.contains_key(id) {
            let project = self.store.load(id).await?;
            open.insert(id.to_string(), project);
        }
        let project = open
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let path = self.store.save(project).await?;
        drop(open);

        self.events.emit(EngineEvent::ProjectSaved {
            project_id: id.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
        Ok(path)
    }

    pub async fn add_clip(&self, id: &str, track_id: &str, clip: Clip) -> Result<String, EngineError> {
        let clip_id = self.with_project(id, |p| p.add_clip(track_id, clip)).await?;
        info!(project_id = id, track_id, clip_id = %clip_id, "[PROJECT] Clip added");
        self.events.emit(EngineEvent::ClipAdded {
            project_id: id.to_string(),
            track_id: track_id.to_string(),
            clip_id: clip_id.clone(),
        });
        Ok(clip_id)
    }

    pub async fn remove_clip(&self, id: &str, clip_id: &str) -> Result<Clip, EngineError> {
        let clip = self.with_project(id, |p| p.remove_clip(clip_id)).await?;
        self.events.emit(EngineEvent::ClipRemoved {
            project_id: id.to_string(),
            clip_id: clip_id.to_string(),
        });
        Ok(clip)
    }

    pub async fn move_clip(&self, id: &str, clip_id: &str, new_time: f64, new_track_id: &str) -> Result<(), EngineError> {
        self.with_project(id, |p| p.move_clip(clip_id, new_time, new_track_id))
            .await?;
        self.events.emit(EngineEvent::ClipMoved {
            project_id: id.to_string(),
            clip_id: clip_id.to_string(),
            track_id: new_track_id.to_string(),
            time: new_time,
        });
        Ok(())
    }

    pub async fn update_clip_property(
        &self,
        id: &str,
        clip_id: &str,
        property: &str,
        value: &serde_json::Value,
    ) -> Result<(), EngineError> {
        self.with_project(id, |p| p.update_clip_property(clip_id, property, value))
            .await?;
        self.events.emit(EngineEvent::ClipUpdated {
            project_id: id.to_string(),
            clip_id: clip_id.to_string(),
            property: property.to_string(),
        });
        Ok(())
    }

    /// Applies a transport command and returns the resulting timeline.
    pub async fn playback(&self, id: &str, command: PlaybackCommand) -> Result<Timeline, EngineError> {
        let timeline = self
            .with_project(id, |p| {
                p.apply_playback(command)?;
                Ok(p.timeline.clone())
            })
            .await?;

        let project_id = id.to_string();
        match command {
            PlaybackCommand::Play | PlaybackCommand::Pause => {
                self.events.emit(EngineEvent::PlaybackStateChanged {
                    project_id,
                    is_playing: timeline.is_playing,
                });
            }
            PlaybackCommand::Seek(_) => {
                self.events.emit(EngineEvent::Seeked {
                    project_id,
                    time: timeline.current_time,
                });
            }
            PlaybackCommand::Volume(_) => {}
        }
        Ok(timeline)
    }

    /// Runs `op` against the open project, opening it from the store first
    /// when needed.
    async fn with_project<T>(
        &self,
        id: &str,
        op: impl FnOnce(&mut ProjectState) -> Result<T, TimelineError>,
    ) -> Result<T, EngineError> {
        let mut open = self.open.lock().await;
        if !open.contains_key(id) {
            let project = self.store.load(id).await?;
            open.insert(id.to_string(), project);
        }
        let project = open
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(op(project)?)
    }
}
