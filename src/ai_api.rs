// Knoux AI Models API — REST surface for the local inference models
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Each action reads only the fields it needs straight from the JSON body and
// ignores the rest. Missing input is a 400 with the editor's exact wording.

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::engine::{EngineEvent, EventBus};
use crate::error::ApiError;
use crate::models::catalog::{self, ModelConfig};
use crate::models::runner::display_arg;
use crate::models::{ModelKind, ModelSuite};
use crate::state::SharedState;

const MISSING_PARAMETERS: &str = "Missing parameters";
const MISSING_IMAGE: &str = "Missing imagePath parameter";
const MISSING_VIDEO: &str = "Missing videoPath parameter";

/// One POST endpoint under `/api/ai-models`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    GfpganEnhance,
    BeautyGanMakeup,
    StyleGan3Morph,
    DecaExpression,
    DecaCapture,
    Wav2LipSync,
    Wav2LipSyncMulti,
    MediapipeDetectBody,
    MediapipeDetectFaces,
    MediapipeModifyBody,
    MediapipeTrackRealtime,
}

impl AiAction {
    pub const ALL: [AiAction; 11] = [
        AiAction::GfpganEnhance,
        AiAction::BeautyGanMakeup,
        AiAction::StyleGan3Morph,
        AiAction::DecaExpression,
        AiAction::DecaCapture,
        AiAction::Wav2LipSync,
        AiAction::Wav2LipSyncMulti,
        AiAction::MediapipeDetectBody,
        AiAction::MediapipeDetectFaces,
        AiAction::MediapipeModifyBody,
        AiAction::MediapipeTrackRealtime,
    ];

    /// `<model>/<action>`, relative to `/api/ai-models`.
    pub fn path(self) -> &'static str {
        match self {
            AiAction::GfpganEnhance => "gfpgan/enhance",
            AiAction::BeautyGanMakeup => "beautygan/makeup",
            AiAction::StyleGan3Morph => "stylegan3/morph",
            AiAction::DecaExpression => "deca/expression",
            AiAction::DecaCapture => "deca/capture",
            AiAction::Wav2LipSync => "wav2lip/sync",
            AiAction::Wav2LipSyncMulti => "wav2lip/sync-multi",
            AiAction::MediapipeDetectBody => "mediapipe/detect-body",
            AiAction::MediapipeDetectFaces => "mediapipe/detect-faces",
            AiAction::MediapipeModifyBody => "mediapipe/modify-body",
            AiAction::MediapipeTrackRealtime => "mediapipe/track-realtime",
        }
    }

    pub fn from_parts(model: &str, action: &str) -> Option<Self> {
        let wanted = format!("{}/{}", model.to_ascii_lowercase(), action.to_ascii_lowercase());
        Self::ALL.into_iter().find(|a| a.path() == wanted)
    }

    fn missing_message(self) -> &'static str {
        match self {
            AiAction::DecaCapture | AiAction::MediapipeDetectBody | AiAction::MediapipeDetectFaces => MISSING_IMAGE,
            AiAction::MediapipeTrackRealtime => MISSING_VIDEO,
            _ => MISSING_PARAMETERS,
        }
    }

    /// Checks the body and turns it into a ready-to-run job.
    pub fn parse(self, body: Value) -> Result<AiJob, ApiError> {
        let missing = || ApiError::BadRequest(self.missing_message().to_string());
        let text = |key: &str| text_field(&body, key).ok_or_else(missing);
        let scalar = |key: &str| scalar_field(&body, key).ok_or_else(missing);
        let structured = |key: &str| structured_field(&body, key).ok_or_else(missing);

        let job = match self {
            AiAction::GfpganEnhance => AiJob::Enhance {
                image: text("imagePath")?,
                level: scalar("enhancementLevel")?,
            },
            AiAction::BeautyGanMakeup => AiJob::Makeup {
                image: text("imagePath")?,
                style: text("style")?,
                strength: scalar("strength")?,
            },
            AiAction::StyleGan3Morph => AiJob::Morph {
                image: text("imagePath")?,
                parameters: structured("parameters")?,
            },
            AiAction::DecaExpression => AiJob::Expression {
                image: text("imagePath")?,
                expression: text("expression")?,
                intensity: scalar("intensity")?,
            },
            AiAction::DecaCapture => AiJob::Capture { image: text("imagePath")? },
            AiAction::Wav2LipSync => AiJob::LipSync {
                video: text("videoPath")?,
                audio: text("audioPath")?,
            },
            AiAction::Wav2LipSyncMulti => AiJob::LipSyncMulti {
                video: text("videoPath")?,
                audio: text("audioPath")?,
                faces: body
                    .get("faceIndices")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(display_arg).collect())
                    .ok_or_else(missing)?,
            },
            AiAction::MediapipeDetectBody => AiJob::DetectBody { image: text("imagePath")? },
            AiAction::MediapipeDetectFaces => AiJob::DetectFaces { image: text("imagePath")? },
            AiAction::MediapipeModifyBody => AiJob::ModifyBody {
                image: text("imagePath")?,
                modifications: structured("modifications")?,
            },
            AiAction::MediapipeTrackRealtime => AiJob::Track { video: text("videoPath")? },
        };
        Ok(job)
    }
}

/// A non-empty string field.
fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A number, string or bool, in the form it is handed to the script.
fn scalar_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        v @ (Value::Number(_) | Value::String(_) | Value::Bool(_)) => Some(display_arg(v)),
        _ => None,
    }
}

fn structured_field(body: &Value, key: &str) -> Option<Value> {
    body.get(key).filter(|v| !v.is_null()).cloned()
}

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub enum AiJob {
    Enhance { image: String, level: String },
    Makeup { image: String, style: String, strength: String },
    Morph { image: String, parameters: Value },
    Expression { image: String, expression: String, intensity: String },
    Capture { image: String },
    LipSync { video: String, audio: String },
    LipSyncMulti { video: String, audio: String, faces: Vec<String> },
    DetectBody { image: String },
    DetectFaces { image: String },
    ModifyBody { image: String, modifications: Value },
    Track { video: String },
}

impl AiJob {
    /// The model that runs this job and the media file it reads.
    pub fn input(&self) -> (ModelKind, &str) {
        match self {
            AiJob::Enhance { image, .. } => (ModelKind::Gfpgan, image),
            AiJob::Makeup { image, .. } => (ModelKind::BeautyGan, image),
            AiJob::Morph { image, .. } => (ModelKind::StyleGan3, image),
            AiJob::Expression { image, .. } | AiJob::Capture { image } => (ModelKind::Deca, image),
            AiJob::LipSync { video, .. } | AiJob::LipSyncMulti { video, .. } => (ModelKind::Wav2Lip, video),
            AiJob::DetectBody { image } | AiJob::DetectFaces { image } | AiJob::ModifyBody { image, .. } => {
                (ModelKind::Mediapipe, image)
            }
            AiJob::Track { video } => (ModelKind::Mediapipe, video),
        }
    }

    async fn execute(&self, models: &ModelSuite) -> Result<Value, ApiError> {
        let result = match self {
            AiJob::Enhance { image, level } => Value::String(models.gfpgan.enhance(image, level).await?),
            AiJob::Makeup { image, style, strength } => {
                Value::String(models.beauty_gan.apply_makeup(image, style, strength).await?)
            }
            AiJob::Morph { image, parameters } => Value::String(models.stylegan3.morph_face(image, parameters).await?),
            AiJob::Expression { image, expression, intensity } => {
                Value::String(models.deca.change_expression(image, expression, intensity).await?)
            }
            AiJob::Capture { image } => models.deca.capture_expression(image).await?,
            AiJob::LipSync { video, audio } => path_value(models.wav2lip.generate_lip_sync(video, audio).await?),
            AiJob::LipSyncMulti { video, audio, faces } => {
                path_value(models.wav2lip.generate_lip_sync_multi(video, audio, faces.as_slice()).await?)
            }
            AiJob::DetectBody { image } => models.mediapipe.detect_body(image).await?,
            AiJob::DetectFaces { image } => models.mediapipe.detect_faces(image).await?,
            AiJob::ModifyBody { image, modifications } => {
                path_value(models.mediapipe.modify_body(image, modifications).await?)
            }
            AiJob::Track { video } => path_value(models.mediapipe.track_realtime(video).await?),
        };
        Ok(result)
    }
}

fn path_value(path: std::path::PathBuf) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

/// Validates `body`, runs the action and returns the bare result (the
/// caller wraps it as `{"result": ...}`). Shared by the HTTP routes and the
/// `run` CLI command.
pub async fn run_action(models: &ModelSuite, events: &EventBus, action: AiAction, body: Value) -> Result<Value, ApiError> {
    let job = action.parse(body)?;
    let operation = action.path().to_string();

    let (kind, input) = job.input();
    if !catalog::supports_format(kind, std::path::Path::new(input)) {
        // The scripts decide for themselves; this is only a hint.
        warn!("[AI-API] {} may not support input format of {}", operation, input);
    }

    info!("[AI-API] {} started", operation);
    events.emit(EngineEvent::ProcessingProgress {
        operation: operation.clone(),
        progress: 0.0,
    });

    let outcome = job.execute(models).await;

    events.emit(EngineEvent::ProcessingProgress {
        operation: operation.clone(),
        progress: 1.0,
    });
    match &outcome {
        Ok(result) => {
            info!("[AI-API] {} finished", operation);
            events.emit(EngineEvent::AnalysisComplete {
                operation,
                success: true,
                result: result.clone(),
            });
        }
        Err(e) => {
            error!("[AI-API] {} failed: {}", operation, e);
            events.emit(EngineEvent::AnalysisComplete {
                operation,
                success: false,
                result: json!({ "error": e.to_string() }),
            });
        }
    }
    outcome
}

pub fn router() -> Router<SharedState> {
    let mut router = Router::new()
        .route("/", get(list_models))
        .route("/:id", get(get_model));

    for action in AiAction::ALL {
        router = router.route(
            &format!("/{}", action.path()),
            post(move |State(state): State<SharedState>, body: Bytes| handle_action(state, action, body)),
        );
    }
    router
}

async fn handle_action(state: SharedState, action: AiAction, body: Bytes) -> Result<Json<Value>, ApiError> {
    // An empty body behaves like `{}`, which then fails validation as missing fields.
    let body: Value = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest(action.missing_message().to_string()))?
    };
    let result = run_action(&state.models, &state.events, action, body).await?;
    Ok(Json(json!({ "result": result })))
}

async fn list_models() -> Json<Vec<ModelConfig>> {
    Json(catalog::catalog())
}

async fn get_model(Path(id): Path<String>) -> Result<Json<ModelConfig>, ApiError> {
    catalog::model_by_id(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown model: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_request(result: Result<AiJob, ApiError>) -> String {
        match result {
            Err(ApiError::BadRequest(msg)) => msg,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_action_paths_resolve() {
        for action in AiAction::ALL {
            let (model, verb) = action.path().split_once('/').unwrap();
            assert_eq!(AiAction::from_parts(model, verb), Some(action));
        }
        assert_eq!(AiAction::from_parts("GFPGAN", "Enhance"), Some(AiAction::GfpganEnhance));
        assert_eq!(AiAction::from_parts("gfpgan", "explode"), None);
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let msg = bad_request(AiAction::GfpganEnhance.parse(json!({ "imagePath": "", "enhancementLevel": 1 })));
        assert_eq!(msg, MISSING_PARAMETERS);

        let msg = bad_request(AiAction::DecaCapture.parse(json!({ "imagePath": "" })));
        assert_eq!(msg, MISSING_IMAGE);

        let msg = bad_request(AiAction::MediapipeTrackRealtime.parse(json!({})));
        assert_eq!(msg, MISSING_VIDEO);
    }

    #[test]
    fn test_zero_is_a_valid_number() {
        let job = AiAction::GfpganEnhance
            .parse(json!({ "imagePath": "a.png", "enhancementLevel": 0 }))
            .unwrap();
        assert_eq!(job, AiJob::Enhance { image: "a.png".into(), level: "0".into() });
    }

    #[test]
    fn test_null_structured_fields_are_missing() {
        let msg = bad_request(AiAction::StyleGan3Morph.parse(json!({ "imagePath": "a.png", "parameters": null })));
        assert_eq!(msg, MISSING_PARAMETERS);

        let job = AiAction::StyleGan3Morph
            .parse(json!({ "imagePath": "a.png", "parameters": {} }))
            .unwrap();
        assert_eq!(job, AiJob::Morph { image: "a.png".into(), parameters: json!({}) });
    }

    #[test]
    fn test_multi_face_indices() {
        let job = AiAction::Wav2LipSyncMulti
            .parse(json!({ "videoPath": "v.mp4", "audioPath": "a.wav", "faceIndices": [0, 2] }))
            .unwrap();
        assert_eq!(
            job,
            AiJob::LipSyncMulti { video: "v.mp4".into(), audio: "a.wav".into(), faces: vec!["0".into(), "2".into()] }
        );

        let job = AiAction::Wav2LipSyncMulti
            .parse(json!({ "videoPath": "v.mp4", "audioPath": "a.wav", "faceIndices": [-1, "3"] }))
            .unwrap();
        assert!(matches!(job, AiJob::LipSyncMulti { ref faces, .. } if faces == &["-1", "3"]));
        let msg = bad_request(AiAction::Wav2LipSyncMulti.parse(json!({ "videoPath": "v.mp4", "audioPath": "a.wav" })));
        assert_eq!(msg, MISSING_PARAMETERS);
    }

    #[test]
    fn test_unused_fields_are_ignored() {
        let job = AiAction::DecaCapture
            .parse(json!({ "imagePath": "a.png", "strength": "high", "faceIndices": "all" }))
            .unwrap();
        assert_eq!(job, AiJob::Capture { image: "a.png".into() });
    }

    #[test]
    fn test_string_numbers_are_passed_through() {
        let job = AiAction::GfpganEnhance
            .parse(json!({ "imagePath": "a.png", "enhancementLevel": "0.5" }))
            .unwrap();
        assert_eq!(job, AiJob::Enhance { image: "a.png".into(), level: "0.5".into() });

        let msg = bad_request(AiAction::DecaExpression.parse(json!({
            "imagePath": "a.png",
            "expression": "happy",
            "intensity": null,
        })));
        assert_eq!(msg, MISSING_PARAMETERS);
    }

    #[test]
    fn test_job_input_names_model_and_file() {
        let job = AiAction::MediapipeTrackRealtime.parse(json!({ "videoPath": "run.webm" })).unwrap();
        assert_eq!(job.input(), (ModelKind::Mediapipe, "run.webm"));
        assert!(catalog::supports_format(ModelKind::Mediapipe, std::path::Path::new("run.webm")));
    }
}
