// Knoux BeautyGAN Wrapper — makeup transfer
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::presets::makeup_preset;
use super::runner::{ModelError, ScriptJob, ScriptRunner};

const LABEL: &str = "BeautyGAN";

pub struct BeautyGan {
    model_path: PathBuf,
    runner: Arc<ScriptRunner>,
}

impl BeautyGan {
    pub fn new(model_path: impl Into<PathBuf>, runner: Arc<ScriptRunner>) -> Self {
        Self { model_path: model_path.into(), runner }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub async fn apply_makeup(&self, image_path: &str, style: &str, strength: impl Display) -> Result<String, ModelError> {
        if makeup_preset(style).is_none() {
            // Reference images and custom styles are the script's business.
            debug!("[BEAUTYGAN] '{}' is not a built-in style, passing through", style);
        }
        let out = self.runner.run(self.makeup_job(image_path, style, strength)).await?;
        Ok(out.text())
    }

    pub(crate) fn makeup_job(&self, image_path: &str, style: &str, strength: impl Display) -> ScriptJob {
        ScriptJob::new(LABEL, "beautygan_inference.py")
            .flag("--input", image_path)
            .flag("--style", style)
            .flag("--strength", strength.to_string())
            .path_flag("--model_path", &self.model_path)
    }
}
