// Knoux Project API — timeline editing and persistence over REST
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::{Clip, PlaybackCommand, ProjectState, Timeline};
use crate::error::{ApiError, JsonBody};
use crate::state::SharedState;

const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

#[derive(Debug, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveClipRequest {
    pub new_time: f64,
    pub new_track_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClipRequest {
    pub property: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackAction {
    Play,
    Pause,
    Seek,
    Volume,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackRequest {
    pub action: PlaybackAction,
    pub value: Option<f64>,
}

impl PlaybackRequest {
    fn command(&self) -> Result<PlaybackCommand, ApiError> {
        let value = || {
            self.value
                .ok_or_else(|| ApiError::BadRequest("Missing value parameter".to_string()))
        };
        Ok(match self.action {
            PlaybackAction::Play => PlaybackCommand::Play,
            PlaybackAction::Pause => PlaybackCommand::Pause,
            PlaybackAction::Seek => PlaybackCommand::Seek(value()?),
            PlaybackAction::Volume => PlaybackCommand::Volume(value()?),
        })
    }
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/:id", get(get_project))
        .route("/:id/save", post(save_project))
        .route("/:id/tracks/:track_id/clips", post(add_clip))
        .route("/:id/clips/:clip_id", patch(update_clip).delete(remove_clip))
        .route("/:id/clips/:clip_id/move", post(move_clip))
        .route("/:id/playback", post(playback))
}

async fn create_project(
    State(state): State<SharedState>,
    body: Option<Json<CreateProjectRequest>>,
) -> Result<(StatusCode, Json<ProjectState>), ApiError> {
    let name = body
        .and_then(|Json(b)| b.name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
    let project = state.projects.create(&name).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(State(state): State<SharedState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.projects.list().await?))
}

async fn get_project(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<ProjectState>, ApiError> {
    Ok(Json(state.projects.get(&id).await?))
}

async fn save_project(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let path = state.projects.save(&id).await?;
    Ok(Json(json!({ "path": path.to_string_lossy() })))
}

async fn add_clip(
    State(state): State<SharedState>,
    Path((id, track_id)): Path<(String, String)>,
    JsonBody(clip): JsonBody<Clip>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let clip_id = state.projects.add_clip(&id, &track_id, clip).await?;
    Ok((StatusCode::CREATED, Json(json!({ "clipId": clip_id }))))
}

async fn remove_clip(
    State(state): State<SharedState>,
    Path((id, clip_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.projects.remove_clip(&id, &clip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn move_clip(
    State(state): State<SharedState>,
    Path((id, clip_id)): Path<(String, String)>,
    JsonBody(req): JsonBody<MoveClipRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .projects
        .move_clip(&id, &clip_id, req.new_time, &req.new_track_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_clip(
    State(state): State<SharedState>,
    Path((id, clip_id)): Path<(String, String)>,
    JsonBody(req): JsonBody<UpdateClipRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .projects
        .update_clip_property(&id, &clip_id, &req.property, &req.value)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn playback(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<PlaybackRequest>,
) -> Result<Json<Timeline>, ApiError> {
    let command = req.command()?;
    Ok(Json(state.projects.playback(&id, command).await?))
}
