// Knoux Project Model
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Serde mirror of the editor's project JSON (camelCase keys). These records
// describe what the UI shows; the timeline operations in `timeline.rs` are
// the only code that mutates them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::presets::ProcessingSettings;

pub const PROJECT_FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub id: String,
    pub name: String,
    pub timeline: Timeline,
    pub settings: ProjectSettings,
    pub metadata: ProjectMetadata,
}

impl ProjectState {
    /// Empty 1080p30 project with one video and one audio lane.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            timeline: Timeline {
                tracks: vec![
                    Track::new("track-video-1", "Video 1", TrackKind::Video),
                    Track::new("track-audio-1", "Audio 1", TrackKind::Audio),
                ],
                ..Timeline::default()
            },
            settings: ProjectSettings::default(),
            metadata: ProjectMetadata {
                created_at: now.clone(),
                modified_at: now,
                version: PROJECT_FORMAT_VERSION.to_string(),
                author: String::new(),
                description: None,
                tags: Vec::new(),
            },
        }
    }

    pub fn touch(&mut self) {
        self.metadata.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Seconds.
    pub duration: f64,
    pub current_time: f64,
    pub tracks: Vec<Track>,
    pub zoom: f64,
    pub playhead_position: f64,
    /// Transport state; not part of older project files.
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_volume() -> f64 {
    1.0
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            duration: 0.0,
            current_time: 0.0,
            tracks: Vec::new(),
            zoom: 1.0,
            playhead_position: 0.0,
            is_playing: false,
            volume: default_volume(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Effect,
    AiLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub locked: bool,
    pub height: u32,
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            clips: Vec::new(),
            muted: false,
            locked: false,
            height: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipKind {
    VideoClip,
    AudioClip,
    ImageClip,
    TextClip,
    AiGenerated,
    FaceFx,
    BodyFx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ClipKind,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub properties: ClipProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_settings: Option<AiSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MediaSource>,
}

impl Clip {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipProperties {
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub effects: Vec<Effect>,
    pub opacity: f64,
    pub blend_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_settings: Option<AiSettings>,
}

impl Default for ClipProperties {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            effects: Vec::new(),
            opacity: 1.0,
            blend_mode: "normal".to_string(),
            ai_settings: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1920.0,
            height: 1080.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub enabled: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(rename = "faceFX", default, skip_serializing_if = "Option::is_none")]
    pub face_fx: Option<FaceFxSettings>,
    #[serde(rename = "bodyFX", default, skip_serializing_if = "Option::is_none")]
    pub body_fx: Option<BodyFxSettings>,
    #[serde(rename = "makeupFX", default, skip_serializing_if = "Option::is_none")]
    pub makeup_fx: Option<MakeupSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lip_sync: Option<LipSyncSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceFxSettings {
    pub enabled: bool,
    pub face_index: u32,
    pub enhancement: FaceEnhancement,
    pub morphing: FaceMorphing,
    pub beautification: Beautification,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceEnhancement {
    /// 0..1
    pub level: f64,
    pub skin_smoothing: f64,
    pub eye_enhancement: f64,
    pub teeth_whitening: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMorphing {
    /// 0.5..2.0
    pub eye_size: f64,
    pub nose_size: f64,
    pub face_width: f64,
    pub smile_intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinTone {
    Light,
    Medium,
    Dark,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beautification {
    pub skin_tone: SkinTone,
    pub remove_imperfections: bool,
    pub sharpen_details: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Male,
    Female,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyPreset {
    Slim,
    Sport,
    Fashion,
    Natural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyFxSettings {
    pub enabled: bool,
    pub body_type: BodyType,
    pub modifications: BodyModifications,
    pub presets: BodyPreset,
}

/// Scale factors, 0.5..2.0. Serialized as-is for the body modification script.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyModifications {
    pub shoulder_width: f64,
    pub waist_size: f64,
    pub height: f64,
    pub leg_length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MakeupStyle {
    Natural,
    Party,
    Wedding,
    Fantasy,
    Kpop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeupSettings {
    pub enabled: bool,
    pub style: MakeupStyle,
    pub intensity: f64,
    pub components: MakeupComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeupComponents {
    pub eyes: MakeupLayer,
    pub lips: MakeupLayer,
    pub cheeks: MakeupLayer,
    pub eyebrows: MakeupLayer,
    pub foundation: MakeupLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeupLayer {
    pub enabled: bool,
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LipSyncAccuracy {
    Fast,
    Balanced,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LipSyncSettings {
    pub enabled: bool,
    pub audio_source: String,
    pub accuracy: LipSyncAccuracy,
    pub face_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Surprised,
    Angry,
    Neutral,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionSettings {
    pub enabled: bool,
    pub mood: Mood,
    pub intensity: f64,
    pub components: ExpressionComponents,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpressionComponents {
    pub eyebrows: f64,
    pub eyes: f64,
    pub mouth: f64,
    pub cheeks: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Camera,
    Screen,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MediaMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAiProcessing {
    pub enable_local_processing: bool,
    pub gpu_acceleration: bool,
    pub max_concurrent_tasks: usize,
}

impl From<&ProcessingSettings> for ProjectAiProcessing {
    fn from(s: &ProcessingSettings) -> Self {
        Self {
            enable_local_processing: true,
            gpu_acceleration: s.enable_gpu_acceleration,
            max_concurrent_tasks: s.max_concurrent_tasks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub resolution: Resolution,
    pub frame_rate: f64,
    pub audio_sample_rate: u32,
    pub color_space: String,
    pub language: Language,
    pub theme: Theme,
    pub ai_processing: ProjectAiProcessing,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution { width: 1920, height: 1080 },
            frame_rate: 30.0,
            audio_sample_rate: 48_000,
            color_space: "rec709".to_string(),
            language: Language::En,
            theme: Theme::Dark,
            ai_processing: ProjectAiProcessing::from(&ProcessingSettings::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub created_at: String,
    pub modified_at: String,
    pub version: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_project_defaults() {
        let p = ProjectState::new("Birthday");
        assert_eq!(p.timeline.tracks.len(), 2);
        assert_eq!(p.timeline.tracks[0].kind, TrackKind::Video);
        assert_eq!(p.settings.resolution, Resolution { width: 1920, height: 1080 });
        assert_eq!(p.settings.ai_processing.max_concurrent_tasks, 3);
        assert_eq!(p.metadata.version, PROJECT_FORMAT_VERSION);
        assert!(chrono::DateTime::parse_from_rfc3339(&p.metadata.created_at).is_ok());
    }

    #[test]
    fn test_clip_accepts_editor_json() {
        let clip: Clip = serde_json::from_value(json!({
            "id": "clip-1",
            "name": "Intro",
            "type": "face-fx",
            "startTime": 2.5,
            "duration": 4,
            "properties": {
                "transform": { "x": 0, "y": 0, "width": 1280, "height": 720,
                               "rotation": 0, "scaleX": 1, "scaleY": 1 },
                "effects": [{ "id": "fx-1", "type": "blur", "enabled": true,
                              "parameters": { "radius": 3 } }],
                "opacity": 0.8,
                "blendMode": "screen"
            },
            "aiSettings": {
                "lipSync": { "enabled": true, "audioSource": "voice.wav",
                             "accuracy": "high", "faceIndex": 0 }
            }
        }))
        .unwrap();

        assert_eq!(clip.kind, ClipKind::FaceFx);
        assert_eq!(clip.end_time(), 6.5);
        assert_eq!(clip.properties.effects[0].parameters["radius"], 3);
        let lip = clip.ai_settings.as_ref().and_then(|a| a.lip_sync.as_ref()).unwrap();
        assert_eq!(lip.accuracy, LipSyncAccuracy::High);

        let back = serde_json::to_value(&clip).unwrap();
        assert_eq!(back["type"], "face-fx");
        assert_eq!(back["properties"]["blendMode"], "screen");
        assert!(back.get("source").is_none());
    }

    #[test]
    fn test_track_kind_wire_names() {
        assert_eq!(serde_json::to_value(TrackKind::AiLayer).unwrap(), "ai-layer");
        let t: Track = serde_json::from_value(json!({
            "id": "t", "name": "FX", "type": "effect", "height": 40
        }))
        .unwrap();
        assert!(t.clips.is_empty() && !t.locked);
    }
}
