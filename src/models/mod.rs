// Knoux AI Model Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Wrappers around the local inference scripts, all sharing one bounded
// `ScriptRunner`.

pub mod beauty_gan;
pub mod catalog;
pub mod deca;
pub mod gfpgan;
pub mod mediapipe;
pub mod presets;
pub mod runner;
pub mod stylegan3;
pub mod wav2lip;

use std::sync::Arc;

pub use beauty_gan::BeautyGan;
pub use catalog::{ModelConfig, ModelKind};
pub use deca::Deca;
pub use gfpgan::Gfpgan;
pub use mediapipe::Mediapipe;
pub use runner::{ModelError, RunnerLimits, ScriptJob, ScriptOutput, ScriptRunner};
pub use stylegan3::StyleGan3;
pub use wav2lip::Wav2Lip;

use crate::config::RuntimeConfig;

/// Every model wrapper, wired to the same job pool.
pub struct ModelSuite {
    pub gfpgan: Gfpgan,
    pub beauty_gan: BeautyGan,
    pub stylegan3: StyleGan3,
    pub deca: Deca,
    pub wav2lip: Wav2Lip,
    pub mediapipe: Mediapipe,
    runner: Arc<ScriptRunner>,
}

impl ModelSuite {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let runner = Arc::new(ScriptRunner::new(
            config.python.clone(),
            config.scripts_dir.clone(),
            config.tmp_dir.clone(),
            RunnerLimits {
                max_concurrent: config.max_concurrent,
                timeout: config.job_timeout,
            },
        ));
        let paths = config.model_paths();

        Self {
            gfpgan: Gfpgan::new(paths.gfpgan, runner.clone()),
            beauty_gan: BeautyGan::new(paths.beauty_gan, runner.clone()),
            stylegan3: StyleGan3::new(paths.stylegan3, runner.clone()),
            deca: Deca::new(paths.deca, paths.deca_config, runner.clone()),
            wav2lip: Wav2Lip::new(paths.wav2lip, runner.clone()),
            mediapipe: Mediapipe::new(paths.mediapipe, runner.clone()),
            runner,
        }
    }

    pub fn runner(&self) -> &ScriptRunner {
        &self.runner
    }
}
