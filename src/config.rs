// Knoux Runtime Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Settings come from `.env` / process environment, then CLI flags override
// them in `main`. Every value has a working default so `knoux-core serve`
// runs with no setup.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::models::presets;
use crate::models::ModelKind;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub port: u16,
    /// Interpreter used to launch inference scripts.
    pub python: String,
    /// Directory holding the `*_inference.py` scripts.
    pub scripts_dir: PathBuf,
    /// Directory holding the model weights (`gfpgan/gfpgan.pth`, ...).
    pub models_dir: PathBuf,
    /// Scratch directory for generated videos/images/tracking files.
    pub tmp_dir: PathBuf,
    pub projects_dir: PathBuf,
    /// `None` means jobs may run forever.
    pub job_timeout: Option<Duration>,
    pub max_concurrent: usize,
}

/// Resolved weight/config locations for every model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub gfpgan: PathBuf,
    pub beauty_gan: PathBuf,
    pub stylegan3: PathBuf,
    pub deca: PathBuf,
    pub deca_config: PathBuf,
    pub wav2lip: PathBuf,
    pub mediapipe: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            python: "python3".to_string(),
            scripts_dir: PathBuf::from("knoux_models"),
            models_dir: PathBuf::from("knoux_models"),
            tmp_dir: PathBuf::from("tmp"),
            projects_dir: PathBuf::from(".knoux").join("projects"),
            job_timeout: Some(Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS)),
            max_concurrent: presets::ProcessingSettings::default().max_concurrent_tasks,
        }
    }
}

impl RuntimeConfig {
    /// Build the config from environment variables, falling back to defaults.
    ///
    /// The concurrency default is derived from host memory the same way the
    /// editor picks its hardware preset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), presets::host_total_memory_mb())
    }

    /// Testable core of [`RuntimeConfig::from_env`].
    pub fn from_lookup<F>(lookup: F, host_memory_mb: u64) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let preset_limit = presets::optimal_settings(host_memory_mb).max_concurrent_tasks;

        let timeout_secs: u64 = parse_or(&lookup, "KNOUX_JOB_TIMEOUT_SECS", DEFAULT_JOB_TIMEOUT_SECS);
        let max_concurrent: usize = parse_or(&lookup, "KNOUX_MAX_CONCURRENT", preset_limit);

        Self {
            port: parse_or(&lookup, "KNOUX_PORT", defaults.port),
            python: lookup("KNOUX_PYTHON")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.python),
            scripts_dir: lookup("KNOUX_SCRIPTS_DIR").map(PathBuf::from).unwrap_or(defaults.scripts_dir),
            models_dir: lookup("KNOUX_MODELS_DIR").map(PathBuf::from).unwrap_or(defaults.models_dir),
            tmp_dir: lookup("KNOUX_TMP_DIR").map(PathBuf::from).unwrap_or(defaults.tmp_dir),
            projects_dir: lookup("KNOUX_PROJECTS_DIR").map(PathBuf::from).unwrap_or(defaults.projects_dir),
            job_timeout: timeout_from_secs(timeout_secs),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::under(&self.models_dir)
    }
}

impl ModelPaths {
    pub fn under(root: &Path) -> Self {
        Self {
            gfpgan: root.join("gfpgan").join("gfpgan.pth"),
            beauty_gan: root.join("beauty_gan").join("beauty_gan.pth"),
            stylegan3: root.join("stylegan3").join("stylegan3.pkl"),
            deca: root.join("deca").join("deca.pkl"),
            deca_config: root.join("deca").join("config.yaml"),
            wav2lip: root.join("wav2lip").join("wav2lip.pth"),
            mediapipe: root.join("mediapipe"),
        }
    }

    /// Files (or, for Mediapipe, the directory) a model needs on disk.
    pub fn weights_for(&self, kind: ModelKind) -> Vec<&Path> {
        match kind {
            ModelKind::Gfpgan => vec![self.gfpgan.as_path()],
            ModelKind::BeautyGan => vec![self.beauty_gan.as_path()],
            ModelKind::StyleGan3 => vec![self.stylegan3.as_path()],
            ModelKind::Deca => vec![self.deca.as_path(), self.deca_config.as_path()],
            ModelKind::Wav2Lip => vec![self.wav2lip.as_path()],
            ModelKind::Mediapipe => vec![self.mediapipe.as_path()],
        }
    }
}

/// `0` disables the timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("[CONFIG] Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        None => default,
    }
}
