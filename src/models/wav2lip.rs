// Knoux Wav2Lip Wrapper — audio-driven lip synchronisation
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Results are written to a fresh file in the scratch directory; the wrapper
// returns that path once the script exits cleanly.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::runner::{ModelError, ScriptJob, ScriptRunner};

pub struct Wav2Lip {
    model_path: PathBuf,
    runner: Arc<ScriptRunner>,
}

impl Wav2Lip {
    pub fn new(model_path: impl Into<PathBuf>, runner: Arc<ScriptRunner>) -> Self {
        Self { model_path: model_path.into(), runner }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub async fn generate_lip_sync(&self, video_path: &str, audio_path: &str) -> Result<PathBuf, ModelError> {
        let outfile = self.runner.output_path("lipsync", "mp4").await?;
        self.runner
            .run(self.sync_job(video_path, audio_path, &outfile))
            .await?;
        Ok(outfile)
    }

    /// Same as [`Wav2Lip::generate_lip_sync`] but only animates the listed faces.
    pub async fn generate_lip_sync_multi<I: Display + Sync>(
        &self,
        video_path: &str,
        audio_path: &str,
        face_indices: &[I],
    ) -> Result<PathBuf, ModelError> {
        let outfile = self.runner.output_path("lipsync_multi", "mp4").await?;
        self.runner
            .run(self.multi_job(video_path, audio_path, &outfile, face_indices))
            .await?;
        Ok(outfile)
    }

    pub(crate) fn sync_job(&self, video_path: &str, audio_path: &str, outfile: &Path) -> ScriptJob {
        ScriptJob::new("Wav2Lip", "wav2lip_inference.py")
            .path_flag("--checkpoint_path", &self.model_path)
            .flag("--face", video_path)
            .flag("--audio", audio_path)
            .path_flag("--outfile", outfile)
    }

    pub(crate) fn multi_job<I: Display>(
        &self,
        video_path: &str,
        audio_path: &str,
        outfile: &Path,
        face_indices: &[I],
    ) -> ScriptJob {
        let indices = face_indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        ScriptJob::new("Wav2Lip multiface", "wav2lip_multiface.py")
            .path_flag("--checkpoint_path", &self.model_path)
            .flag("--face", video_path)
            .flag("--audio", audio_path)
            .path_flag("--outfile", outfile)
            .flag("--face_indices", indices)
    }
}
