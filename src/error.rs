// Knoux API Errors
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::engine::{EngineError, StoreError, TimelineError};
use crate::models::ModelError;

/// Every handler failure. The rendered body is always `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Timeline(e) => ApiError::Timeline(e),
            EngineError::Store(e) => ApiError::Store(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `axum::Json` whose rejections come back as `{"error": ...}` 400s.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeline(e) => match e {
                TimelineError::TrackNotFound(_) | TimelineError::ClipNotFound(_) => StatusCode::NOT_FOUND,
                TimelineError::TrackLocked(_) => StatusCode::CONFLICT,
                TimelineError::InvalidClip(_) | TimelineError::InvalidProperty { .. } => StatusCode::BAD_REQUEST,
            },
            ApiError::Store(e) => match e {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::InvalidId(_) => StatusCode::BAD_REQUEST,
                StoreError::Io { .. } | StoreError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn body(&self) -> serde_json::Value {
        json!({ "error": self.to_string() })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("[API] {}", self);
        } else {
            warn!("[API] {} {}", status.as_u16(), self);
        }
        (status, Json(self.body())).into_response()
    }
}
