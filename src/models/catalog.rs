// Knoux Model Catalog
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Static description of every local inference model the gateway drives:
// identity, weights location, capabilities, and resource footprint.

use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Gfpgan,
    BeautyGan,
    StyleGan3,
    Deca,
    Wav2Lip,
    Mediapipe,
}

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::Gfpgan,
        ModelKind::BeautyGan,
        ModelKind::StyleGan3,
        ModelKind::Deca,
        ModelKind::Wav2Lip,
        ModelKind::Mediapipe,
    ];

    /// Name used in process error messages ("GFPGAN process exited ...").
    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Gfpgan => "GFPGAN",
            ModelKind::BeautyGan => "BeautyGAN",
            ModelKind::StyleGan3 => "StyleGAN3",
            ModelKind::Deca => "DECA",
            ModelKind::Wav2Lip => "Wav2Lip",
            ModelKind::Mediapipe => "Mediapipe",
        }
    }

    /// Path segment used under `/api/ai-models/`.
    pub fn route(self) -> &'static str {
        match self {
            ModelKind::Gfpgan => "gfpgan",
            ModelKind::BeautyGan => "beautygan",
            ModelKind::StyleGan3 => "stylegan3",
            ModelKind::Deca => "deca",
            ModelKind::Wav2Lip => "wav2lip",
            ModelKind::Mediapipe => "mediapipe",
        }
    }

    /// Scripts this model may invoke, used by the dependency check.
    pub fn scripts(self) -> &'static [&'static str] {
        match self {
            ModelKind::Gfpgan => &["gfpgan_inference.py"],
            ModelKind::BeautyGan => &["beautygan_inference.py"],
            ModelKind::StyleGan3 => &["stylegan3_inference.py"],
            ModelKind::Deca => &["deca_inference.py", "deca_capture.py"],
            ModelKind::Wav2Lip => &["wav2lip_inference.py", "wav2lip_multiface.py"],
            ModelKind::Mediapipe => &[
                "mediapipe_body_detection.py",
                "mediapipe_face_detection.py",
                "mediapipe_body_modification.py",
                "mediapipe_realtime_tracking.py",
            ],
        }
    }

    pub fn config(self) -> ModelConfig {
        match self {
            ModelKind::Gfpgan => ModelConfig {
                kind: self,
                id: "gfpgan",
                name: "GFPGAN Face Enhancement",
                version: "1.3.8",
                model_path: "./knoux_models/gfpgan/gfpgan.pth",
                config_path: None,
                is_local: true,
                capabilities: &[
                    "face-enhancement",
                    "skin-smoothing",
                    "detail-restoration",
                    "imperfection-removal",
                ],
                performance: Performance { cpu: Load::Medium, gpu: Load::High, memory_mb: 512 },
                supported_formats: &["jpg", "png", "bmp", "tiff"],
            },
            ModelKind::BeautyGan => ModelConfig {
                kind: self,
                id: "beauty-gan",
                name: "BeautyGAN Makeup Application",
                version: "2.1.0",
                model_path: "./knoux_models/beauty_gan/beauty_gan.pth",
                config_path: None,
                is_local: true,
                capabilities: &["makeup-application", "lipstick", "eye-makeup", "foundation", "blush"],
                performance: Performance { cpu: Load::Medium, gpu: Load::High, memory_mb: 768 },
                supported_formats: &["jpg", "png"],
            },
            ModelKind::Deca => ModelConfig {
                kind: self,
                id: "deca",
                name: "DECA Expression Control",
                version: "1.0.0",
                model_path: "./knoux_models/deca/deca.pkl",
                config_path: Some("./knoux_models/deca/config.yaml"),
                is_local: true,
                capabilities: &[
                    "expression-editing",
                    "face-reenactment",
                    "emotion-transfer",
                    "3d-face-reconstruction",
                ],
                performance: Performance { cpu: Load::High, gpu: Load::High, memory_mb: 1024 },
                supported_formats: &["jpg", "png", "mp4"],
            },
            ModelKind::Wav2Lip => ModelConfig {
                kind: self,
                id: "wav2lip",
                name: "Wav2Lip Synchronization",
                version: "1.1.0",
                model_path: "./knoux_models/wav2lip/wav2lip.pth",
                config_path: None,
                is_local: true,
                capabilities: &["lip-sync", "audio-visual-sync", "mouth-animation"],
                performance: Performance { cpu: Load::High, gpu: Load::Medium, memory_mb: 896 },
                supported_formats: &["mp4", "avi", "mov", "wav", "mp3"],
            },
            ModelKind::StyleGan3 => ModelConfig {
                kind: self,
                id: "stylegan3",
                name: "StyleGAN3 Face Morphing",
                version: "3.0.0",
                model_path: "./knoux_models/stylegan3/stylegan3.pkl",
                config_path: None,
                is_local: true,
                capabilities: &["face-morphing", "feature-editing", "age-progression", "gender-swap"],
                performance: Performance { cpu: Load::High, gpu: Load::High, memory_mb: 2048 },
                supported_formats: &["jpg", "png"],
            },
            ModelKind::Mediapipe => ModelConfig {
                kind: self,
                id: "mediapipe",
                name: "MediaPipe Body Tracking",
                version: "0.10.9",
                model_path: "./knoux_models/mediapipe/",
                config_path: None,
                is_local: true,
                capabilities: &[
                    "pose-detection",
                    "hand-tracking",
                    "face-mesh",
                    "body-segmentation",
                    "real-time-tracking",
                ],
                performance: Performance { cpu: Load::Low, gpu: Load::Medium, memory_mb: 256 },
                supported_formats: &["jpg", "png", "mp4", "webm"],
            },
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Load {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub cpu: Load,
    pub gpu: Load,
    /// Resident footprint in MB.
    #[serde(rename = "memory")]
    pub memory_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(skip)]
    pub kind: ModelKind,
    pub id: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub model_path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<&'static str>,
    pub is_local: bool,
    pub capabilities: &'static [&'static str],
    pub performance: Performance,
    pub supported_formats: &'static [&'static str],
}

impl ModelConfig {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(&capability)
    }
}

pub fn catalog() -> Vec<ModelConfig> {
    ModelKind::ALL.iter().map(|k| k.config()).collect()
}

/// Accepts the id form (`beauty-gan`), the catalog key form (`BEAUTY_GAN`)
/// and the route form (`beautygan`), case-insensitively.
pub fn model_by_id(id: &str) -> Option<ModelConfig> {
    let wanted = normalize(id);
    if wanted.is_empty() {
        return None;
    }
    ModelKind::ALL
        .iter()
        .map(|k| k.config())
        .find(|cfg| normalize(cfg.id) == wanted || normalize(cfg.kind.route()) == wanted)
}

pub fn models_by_capability(capability: &str) -> Vec<ModelConfig> {
    catalog()
        .into_iter()
        .filter(|m| m.has_capability(capability))
        .collect()
}

/// Sum of the memory footprints; unknown ids contribute nothing.
pub fn estimate_memory_usage<S: AsRef<str>>(ids: &[S]) -> u64 {
    ids.iter()
        .filter_map(|id| model_by_id(id.as_ref()))
        .map(|m| m.performance.memory_mb)
        .sum()
}

pub fn supports_format(kind: ModelKind, path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            kind.config().supported_formats.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn normalize(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_lookup_accepts_all_id_forms() {
        assert_eq!(model_by_id("BEAUTY_GAN").map(|m| m.kind), Some(ModelKind::BeautyGan));
        assert_eq!(model_by_id("beauty-gan").map(|m| m.kind), Some(ModelKind::BeautyGan));
        assert_eq!(model_by_id("beautygan").map(|m| m.kind), Some(ModelKind::BeautyGan));
        assert_eq!(model_by_id("StyleGAN3").map(|m| m.kind), Some(ModelKind::StyleGan3));
        assert!(model_by_id("dall-e").is_none());
        assert!(model_by_id("").is_none());
    }

    #[test]
    fn test_capability_filter() {
        let trackers = models_by_capability("real-time-tracking");
        assert_eq!(trackers.len(), 1);
        assert_eq!(trackers[0].kind, ModelKind::Mediapipe);
        assert!(models_by_capability("teleportation").is_empty());
    }

    #[test]
    fn test_memory_estimate_ignores_unknown() {
        assert_eq!(estimate_memory_usage(&["gfpgan", "DECA", "nope"]), 512 + 1024);
        assert_eq!(estimate_memory_usage::<&str>(&[]), 0);
    }

    #[test]
    fn test_supported_formats() {
        assert!(supports_format(ModelKind::Gfpgan, Path::new("face.PNG")));
        assert!(supports_format(ModelKind::Wav2Lip, Path::new("/clips/talk.mp4")));
        assert!(!supports_format(ModelKind::BeautyGan, Path::new("face.bmp")));
        assert!(!supports_format(ModelKind::Mediapipe, Path::new("no_extension")));
    }

    #[test]
    fn test_catalog_serializes_like_client_config() {
        let json = serde_json::to_value(ModelKind::Deca.config()).unwrap();
        assert_eq!(json["id"], "deca");
        assert_eq!(json["configPath"], "./knoux_models/deca/config.yaml");
        assert_eq!(json["performance"]["memory"], 1024);
        assert_eq!(json["performance"]["cpu"], "high");
        assert!(json.get("kind").is_none());
    }
}
