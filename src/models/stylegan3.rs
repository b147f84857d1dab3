// Knoux StyleGAN3 Wrapper — latent face morphing
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::runner::{ModelError, ScriptJob, ScriptRunner};

const LABEL: &str = "StyleGAN3";

pub struct StyleGan3 {
    model_path: PathBuf,
    runner: Arc<ScriptRunner>,
}

impl StyleGan3 {
    pub fn new(model_path: impl Into<PathBuf>, runner: Arc<ScriptRunner>) -> Self {
        Self { model_path: model_path.into(), runner }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// `parameters` is forwarded verbatim as a JSON argument (eyeSize, age, ...).
    pub async fn morph_face(&self, image_path: &str, parameters: &Value) -> Result<String, ModelError> {
        let out = self.runner.run(self.morph_job(image_path, parameters)).await?;
        Ok(out.text())
    }

    pub(crate) fn morph_job(&self, image_path: &str, parameters: &Value) -> ScriptJob {
        ScriptJob::new(LABEL, "stylegan3_inference.py")
            .flag("--input", image_path)
            .path_flag("--model_path", &self.model_path)
            .flag("--params", parameters.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::runner::offline_runner;
    use serde_json::json;

    #[test]
    fn test_params_are_compact_json() {
        let runner = offline_runner();
        let job = StyleGan3::new("sg3.pkl", runner).morph_job("a.png", &json!({"eyeSize": 1.2}));
        assert_eq!(
            job.args,
            vec!["--input", "a.png", "--model_path", "sg3.pkl", "--params", "{\"eyeSize\":1.2}"]
        );
    }
}
