// Knoux GFPGAN Wrapper — face restoration/enhancement
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::presets::face_enhancement_preset;
use super::runner::{ModelError, ScriptJob, ScriptRunner};

const LABEL: &str = "GFPGAN";

pub struct Gfpgan {
    model_path: PathBuf,
    runner: Arc<ScriptRunner>,
}

impl Gfpgan {
    pub fn new(model_path: impl Into<PathBuf>, runner: Arc<ScriptRunner>) -> Self {
        Self { model_path: model_path.into(), runner }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns whatever the script prints (normally the enhanced image path).
    pub async fn enhance(&self, image_path: &str, enhancement_level: impl Display) -> Result<String, ModelError> {
        let out = self.runner.run(self.enhance_job(image_path, enhancement_level)).await?;
        Ok(out.text())
    }

    pub(crate) fn enhance_job(&self, image_path: &str, enhancement_level: impl Display) -> ScriptJob {
        ScriptJob::new(LABEL, "gfpgan_inference.py")
            .flag("--input", image_path)
            .flag("--enhance", resolve_level(enhancement_level.to_string()))
            .path_flag("--model_path", &self.model_path)
    }
}

/// Named presets ("natural", "strong", ...) become their overall strength.
fn resolve_level(level: String) -> String {
    match face_enhancement_preset(&level) {
        Some(preset) => preset.overall.to_string(),
        None => level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::runner::offline_runner;

    #[test]
    fn test_enhance_arguments() {
        let runner = offline_runner();
        let gfpgan = Gfpgan::new("models/gfpgan/gfpgan.pth", runner);
        let job = gfpgan.enhance_job("face.png", 0.75);
        assert_eq!(job.script, "gfpgan_inference.py");
        assert_eq!(
            job.args,
            vec!["--input", "face.png", "--enhance", "0.75", "--model_path", "models/gfpgan/gfpgan.pth"]
        );
    }

    #[test]
    fn test_named_level_uses_preset() {
        let gfpgan = Gfpgan::new("gfpgan.pth", offline_runner());
        assert_eq!(gfpgan.enhance_job("face.png", "Strong").args[3], "0.8");
        assert_eq!(gfpgan.enhance_job("face.png", "subtle").args[3], "subtle");
    }
}
