// Knoux MediaPipe Wrapper — body/face detection, reshaping and tracking
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::runner::{ModelError, ScriptJob, ScriptRunner};

pub struct Mediapipe {
    model_path: PathBuf,
    runner: Arc<ScriptRunner>,
}

impl Mediapipe {
    /// `model_path` is the directory holding the MediaPipe task bundles.
    pub fn new(model_path: impl Into<PathBuf>, runner: Arc<ScriptRunner>) -> Self {
        Self { model_path: model_path.into(), runner }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Pose landmarks for the primary body.
    pub async fn detect_body(&self, image_path: &str) -> Result<Value, ModelError> {
        let job = self.detect_job("Mediapipe", "mediapipe_body_detection.py", image_path);
        self.runner.run(job).await?.json("Mediapipe")
    }

    /// One entry per detected face.
    pub async fn detect_faces(&self, image_path: &str) -> Result<Value, ModelError> {
        let job = self.detect_job("Mediapipe face", "mediapipe_face_detection.py", image_path);
        self.runner.run(job).await?.json("Mediapipe face")
    }

    pub async fn modify_body(&self, image_path: &str, modifications: &Value) -> Result<PathBuf, ModelError> {
        let output = self.runner.output_path("body_modified", "png").await?;
        self.runner
            .run(self.modify_job(image_path, &output, modifications))
            .await?;
        Ok(output)
    }

    /// Writes per-frame landmarks to a JSON file and returns its path.
    pub async fn track_realtime(&self, video_path: &str) -> Result<PathBuf, ModelError> {
        let output = self.runner.output_path("tracked", "json").await?;
        self.runner.run(self.track_job(video_path, &output)).await?;
        Ok(output)
    }

    fn detect_job(&self, label: &'static str, script: &'static str, image_path: &str) -> ScriptJob {
        ScriptJob::new(label, script)
            .flag("--input", image_path)
            .path_flag("--model_path", &self.model_path)
    }

    pub(crate) fn modify_job(&self, image_path: &str, output: &Path, modifications: &Value) -> ScriptJob {
        ScriptJob::new("Mediapipe body modification", "mediapipe_body_modification.py")
            .flag("--input", image_path)
            .path_flag("--output", output)
            .path_flag("--model_path", &self.model_path)
            .flag("--modifications", modifications.to_string())
    }

    pub(crate) fn track_job(&self, video_path: &str, output: &Path) -> ScriptJob {
        ScriptJob::new("Mediapipe tracking", "mediapipe_realtime_tracking.py")
            .flag("--input", video_path)
            .path_flag("--output", output)
            .path_flag("--model_path", &self.model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::runner::offline_runner;
    use serde_json::json;

    #[test]
    fn test_modify_and_track_arguments() {
        let mp = Mediapipe::new("mediapipe", offline_runner());

        let job = mp.modify_job("pose.png", Path::new("tmp/b.png"), &json!({"waistSize": 0.9}));
        assert_eq!(
            job.args,
            vec![
                "--input", "pose.png",
                "--output", "tmp/b.png",
                "--model_path", "mediapipe",
                "--modifications", "{\"waistSize\":0.9}",
            ]
        );

        let job = mp.track_job("dance.mp4", Path::new("tmp/t.json"));
        assert_eq!(job.script, "mediapipe_realtime_tracking.py");
        assert_eq!(job.label, "Mediapipe tracking");
    }

    #[test]
    fn test_face_detection_label() {
        let mp = Mediapipe::new("mediapipe", offline_runner());
        let job = mp.detect_job("Mediapipe face", "mediapipe_face_detection.py", "crowd.jpg");
        assert_eq!(job.args, vec!["--input", "crowd.jpg", "--model_path", "mediapipe"]);
    }
}
