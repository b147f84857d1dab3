// Knoux Processing Presets
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Hardware tiers that size the job pool, plus the named look presets the
// editor offers for face enhancement, makeup and expressions.

use serde::{Deserialize, Serialize};
use sysinfo::{System, SystemExt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSettings {
    #[serde(rename = "enableGPUAcceleration")]
    pub enable_gpu_acceleration: bool,
    pub max_concurrent_tasks: usize,
    pub priority_queue: bool,
    pub low_memory_mode: bool,
    pub real_time_processing: bool,
    pub cache_results: bool,
    /// MB
    #[serde(rename = "maxCacheSize")]
    pub max_cache_size_mb: u64,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            enable_gpu_acceleration: true,
            max_concurrent_tasks: 3,
            priority_queue: true,
            low_memory_mode: false,
            real_time_processing: true,
            cache_results: true,
            max_cache_size_mb: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HardwarePreset {
    LowEnd,
    Medium,
    HighEnd,
    Ultra,
}

impl HardwarePreset {
    pub fn settings(self) -> ProcessingSettings {
        let base = ProcessingSettings::default();
        match self {
            HardwarePreset::LowEnd => ProcessingSettings {
                enable_gpu_acceleration: false,
                max_concurrent_tasks: 1,
                low_memory_mode: true,
                real_time_processing: false,
                max_cache_size_mb: 256,
                ..base
            },
            HardwarePreset::Medium => ProcessingSettings {
                max_concurrent_tasks: 2,
                max_cache_size_mb: 512,
                ..base
            },
            HardwarePreset::HighEnd => ProcessingSettings {
                max_concurrent_tasks: 6,
                max_cache_size_mb: 2048,
                ..base
            },
            HardwarePreset::Ultra => ProcessingSettings {
                max_concurrent_tasks: 8,
                max_cache_size_mb: 4096,
                ..base
            },
        }
    }

    pub fn for_memory(available_memory_mb: u64) -> Self {
        if available_memory_mb < 4096 {
            HardwarePreset::LowEnd
        } else if available_memory_mb < 8192 {
            HardwarePreset::Medium
        } else if available_memory_mb < 16384 {
            HardwarePreset::HighEnd
        } else {
            HardwarePreset::Ultra
        }
    }
}

pub fn optimal_settings(available_memory_mb: u64) -> ProcessingSettings {
    HardwarePreset::for_memory(available_memory_mb).settings()
}

/// Total RAM of this machine in MB (0 if it can't be read).
pub fn host_total_memory_mb() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.total_memory() / 1_048_576
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceEnhancementPreset {
    pub skin_smoothing: f64,
    pub eye_enhancement: f64,
    pub teeth_whitening: f64,
    pub overall: f64,
}

pub fn face_enhancement_preset(name: &str) -> Option<FaceEnhancementPreset> {
    let (skin_smoothing, eye_enhancement, teeth_whitening, overall) =
        match name.to_ascii_lowercase().as_str() {
            "natural" => (0.3, 0.2, 0.1, 0.4),
            "moderate" => (0.6, 0.4, 0.3, 0.6),
            "strong" => (0.8, 0.7, 0.5, 0.8),
            "maximum" => (1.0, 1.0, 0.8, 1.0),
            _ => return None,
        };
    Some(FaceEnhancementPreset { skin_smoothing, eye_enhancement, teeth_whitening, overall })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MakeupComponent {
    pub intensity: f64,
    /// Coverage, style, colour or placement depending on the component.
    pub variant: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MakeupPreset {
    pub foundation: MakeupComponent,
    pub eyes: MakeupComponent,
    pub lips: MakeupComponent,
    pub blush: MakeupComponent,
}

pub const MAKEUP_STYLES: [&str; 5] = ["natural", "party", "wedding", "fantasy", "kpop"];

pub fn makeup_preset(style: &str) -> Option<MakeupPreset> {
    let c = |intensity: f64, variant: &'static str| MakeupComponent { intensity, variant };
    let preset = match style.to_ascii_lowercase().as_str() {
        "natural" => MakeupPreset {
            foundation: c(0.3, "light"),
            eyes: c(0.2, "subtle"),
            lips: c(0.3, "nude"),
            blush: c(0.2, "natural"),
        },
        "party" => MakeupPreset {
            foundation: c(0.6, "medium"),
            eyes: c(0.8, "dramatic"),
            lips: c(0.7, "bold"),
            blush: c(0.4, "defined"),
        },
        "wedding" => MakeupPreset {
            foundation: c(0.7, "full"),
            eyes: c(0.6, "elegant"),
            lips: c(0.5, "classic"),
            blush: c(0.3, "soft"),
        },
        "fantasy" => MakeupPreset {
            foundation: c(0.5, "medium"),
            eyes: c(1.0, "creative"),
            lips: c(0.9, "fantasy"),
            blush: c(0.6, "artistic"),
        },
        "kpop" => MakeupPreset {
            foundation: c(0.8, "full"),
            eyes: c(0.9, "kpop"),
            lips: c(0.6, "gradient"),
            blush: c(0.5, "youthful"),
        },
        _ => return None,
    };
    Some(preset)
}

/// Signed feature offsets in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpressionPreset {
    pub mouth: f64,
    pub eyes: f64,
    pub eyebrows: f64,
    pub cheeks: f64,
}

pub fn expression_preset(name: &str) -> Option<ExpressionPreset> {
    let (mouth, eyes, eyebrows, cheeks) = match name.to_ascii_lowercase().as_str() {
        "happy" => (0.8, 0.6, 0.3, 0.7),
        "sad" => (-0.6, -0.4, -0.5, -0.3),
        "surprised" => (0.4, 0.9, 0.8, 0.2),
        "angry" => (-0.3, -0.2, -0.8, 0.1),
        "neutral" => (0.0, 0.0, 0.0, 0.0),
        _ => return None,
    };
    Some(ExpressionPreset { mouth, eyes, eyebrows, cheeks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_tiers() {
        assert_eq!(HardwarePreset::for_memory(2048), HardwarePreset::LowEnd);
        assert_eq!(HardwarePreset::for_memory(4096), HardwarePreset::Medium);
        assert_eq!(HardwarePreset::for_memory(8191), HardwarePreset::Medium);
        assert_eq!(HardwarePreset::for_memory(16383), HardwarePreset::HighEnd);
        assert_eq!(HardwarePreset::for_memory(65536), HardwarePreset::Ultra);
    }

    #[test]
    fn test_low_end_preset_disables_heavy_features() {
        let s = optimal_settings(1024);
        assert!(!s.enable_gpu_acceleration);
        assert!(s.low_memory_mode);
        assert!(!s.real_time_processing);
        assert_eq!(s.max_concurrent_tasks, 1);
        assert_eq!(s.max_cache_size_mb, 256);
        // untouched fields inherit the defaults
        assert!(s.priority_queue);
        assert!(s.cache_results);
    }

    #[test]
    fn test_settings_json_keys() {
        let json = serde_json::to_value(ProcessingSettings::default()).unwrap();
        assert_eq!(json["enableGPUAcceleration"], true);
        assert_eq!(json["maxConcurrentTasks"], 3);
        assert_eq!(json["maxCacheSize"], 1024);
    }

    #[test]
    fn test_named_presets() {
        assert_eq!(face_enhancement_preset("STRONG").map(|p| p.overall), Some(0.8));
        assert!(face_enhancement_preset("subtle").is_none());
        assert_eq!(makeup_preset("kpop").map(|p| p.lips.variant), Some("gradient"));
        for style in MAKEUP_STYLES {
            assert!(makeup_preset(style).is_some(), "missing makeup preset {style}");
        }
        assert_eq!(expression_preset("Sad").map(|p| p.mouth), Some(-0.6));
        assert!(expression_preset("custom").is_none());
    }
}
