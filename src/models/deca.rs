// Knoux DECA Wrapper — 3D face reconstruction and expression control
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use serde_json::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::presets::expression_preset;
use super::runner::{ModelError, ScriptJob, ScriptRunner};

const LABEL: &str = "DECA";

pub struct Deca {
    model_path: PathBuf,
    config_path: PathBuf,
    runner: Arc<ScriptRunner>,
}

impl Deca {
    pub fn new(
        model_path: impl Into<PathBuf>,
        config_path: impl Into<PathBuf>,
        runner: Arc<ScriptRunner>,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            config_path: config_path.into(),
            runner,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// `expression` is usually a mood preset (happy, sad, ...) but custom
    /// names are forwarded untouched.
    pub async fn change_expression(
        &self,
        image_path: &str,
        expression: &str,
        intensity: impl Display,
    ) -> Result<String, ModelError> {
        if expression_preset(expression).is_none() {
            debug!("[DECA] Custom expression '{}'", expression);
        }
        let out = self
            .runner
            .run(self.expression_job(image_path, expression, intensity))
            .await?;
        Ok(out.text())
    }

    /// Expression coefficients as reported by the capture script.
    pub async fn capture_expression(&self, image_path: &str) -> Result<Value, ModelError> {
        let out = self.runner.run(self.capture_job(image_path)).await?;
        out.json(LABEL)
    }

    pub(crate) fn expression_job(&self, image_path: &str, expression: &str, intensity: impl Display) -> ScriptJob {
        self.base_job("deca_inference.py", image_path)
            .flag("--expression", expression)
            .flag("--intensity", intensity.to_string())
    }

    pub(crate) fn capture_job(&self, image_path: &str) -> ScriptJob {
        self.base_job("deca_capture.py", image_path)
    }

    fn base_job(&self, script: &'static str, image_path: &str) -> ScriptJob {
        ScriptJob::new(LABEL, script)
            .flag("--input", image_path)
            .path_flag("--model_path", &self.model_path)
            .path_flag("--config_path", &self.config_path)
    }
}
