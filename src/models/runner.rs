// Knoux Script Runner — bounded subprocess execution for inference scripts
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Every model wrapper funnels through `ScriptRunner::run`:
//   1. wait for a slot in the job pool (semaphore sized by hardware preset),
//   2. spawn `<python> <scripts_dir>/<script> <args...>` with piped output,
//   3. enforce the job timeout, killing the child if it is exceeded,
//   4. map exit status to `ScriptOutput` or a `ModelError`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to start {label} process: {source}")]
    Spawn {
        label: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} process I/O failed: {source}")]
    Io {
        label: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} process exited with code {code}: {stderr}")]
    ProcessFailed {
        label: &'static str,
        code: String,
        stderr: String,
    },

    #[error("{label} process timed out after {secs}s")]
    Timeout { label: &'static str, secs: u64 },

    #[error("Failed to parse {label} output: {reason}")]
    InvalidOutput { label: &'static str, reason: String },

    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} job rejected: runner is shutting down")]
    Shutdown { label: &'static str },
}

/// One invocation of an inference script.
#[derive(Debug, Clone)]
pub struct ScriptJob {
    /// Name used in logs and error messages, e.g. "Mediapipe face".
    pub label: &'static str,
    pub script: &'static str,
    pub args: Vec<String>,
}

impl ScriptJob {
    pub fn new(label: &'static str, script: &'static str) -> Self {
        Self { label, script, args: Vec::new() }
    }

    /// Append a `--flag value` pair.
    pub fn flag(mut self, name: &str, value: impl Into<String>) -> Self {
        self.args.push(name.to_string());
        self.args.push(value.into());
        self
    }

    pub fn path_flag(self, name: &str, value: &Path) -> Self {
        self.flag(name, value.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    pub fn text(&self) -> String {
        self.stdout.trim().to_string()
    }

    pub fn json(&self, label: &'static str) -> Result<Value, ModelError> {
        serde_json::from_str(self.stdout.trim()).map_err(|e| ModelError::InvalidOutput {
            label,
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunnerLimits {
    pub max_concurrent: usize,
    pub timeout: Option<Duration>,
}

pub struct ScriptRunner {
    python: String,
    scripts_dir: PathBuf,
    tmp_dir: PathBuf,
    permits: Arc<Semaphore>,
    limits: RunnerLimits,
}

impl ScriptRunner {
    pub fn new(
        python: impl Into<String>,
        scripts_dir: impl Into<PathBuf>,
        tmp_dir: impl Into<PathBuf>,
        limits: RunnerLimits,
    ) -> Self {
        let limits = RunnerLimits {
            max_concurrent: limits.max_concurrent.max(1),
            ..limits
        };
        Self {
            python: python.into(),
            scripts_dir: scripts_dir.into(),
            tmp_dir: tmp_dir.into(),
            permits: Arc::new(Semaphore::new(limits.max_concurrent)),
            limits,
        }
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn limits(&self) -> RunnerLimits {
        self.limits
    }

    /// Jobs currently holding a pool slot.
    pub fn in_flight(&self) -> usize {
        self.limits.max_concurrent - self.permits.available_permits()
    }

    pub async fn run(&self, job: ScriptJob) -> Result<ScriptOutput, ModelError> {
        let label = job.label;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ModelError::Shutdown { label })?;

        let script = self.scripts_dir.join(job.script);
        info!("[RUNNER] {} -> {} {:?}", label, script.display(), job.args);

        let child = Command::new(&self.python)
            .arg(&script)
            .args(&job.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                error!("[RUNNER] Could not spawn {} for {}: {}", self.python, label, source);
                ModelError::Spawn { label, source }
            })?;

        // Dropping the wait future drops the child, and kill_on_drop reaps it.
        let wait = child.wait_with_output();
        let output = match self.limits.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(res) => res,
                Err(_) => {
                    warn!("[RUNNER] {} exceeded {:?}, killing process", label, limit);
                    return Err(ModelError::Timeout { label, secs: limit.as_secs() });
                }
            },
            None => wait.await,
        }
        .map_err(|source| ModelError::Io { label, source })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            debug!("[RUNNER] {} finished ({} bytes stdout)", label, stdout.len());
            Ok(ScriptOutput { stdout, stderr })
        } else {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "null".to_string());
            error!("[RUNNER] {} failed with code {}", label, code);
            Err(ModelError::ProcessFailed { label, code, stderr })
        }
    }

    /// Fresh path in the scratch directory, e.g. `tmp/lipsync_1718000000000_1a2b3c4d.mp4`.
    /// The directory is created on demand.
    pub async fn output_path(&self, prefix: &str, ext: &str) -> Result<PathBuf, ModelError> {
        tokio::fs::create_dir_all(&self.tmp_dir)
            .await
            .map_err(|source| ModelError::OutputDir {
                path: self.tmp_dir.display().to_string(),
                source,
            })?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let tag = uuid::Uuid::new_v4().simple().to_string();
        Ok(self
            .tmp_dir
            .join(format!("{}_{}_{}.{}", prefix, millis, &tag[..8], ext)))
    }
}

/// A JSON value as a CLI argument: strings unquoted, `null` empty, anything
/// else in its JSON form.
pub fn display_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Runner for argument-building tests; never spawns anything.
#[cfg(test)]
pub(crate) fn offline_runner() -> Arc<ScriptRunner> {
    Arc::new(ScriptRunner::new(
        "python3",
        "scripts",
        "tmp",
        RunnerLimits { max_concurrent: 1, timeout: None },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn write_script(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn sh_runner(dir: &Path, max_concurrent: usize, timeout: Option<Duration>) -> ScriptRunner {
        ScriptRunner::new(
            "sh",
            dir,
            dir.join("tmp"),
            RunnerLimits { max_concurrent, timeout },
        )
    }

    #[tokio::test]
    async fn test_success_returns_trimmed_stdout() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "echo.py", "echo \"  $1=$2  \"\n");
        let runner = sh_runner(dir.path(), 2, None);

        let out = runner
            .run(ScriptJob::new("Echo", "echo.py").flag("--input", "face.png"))
            .await
            .unwrap();
        assert_eq!(out.text(), "--input=face.png");
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "fail.py", "echo 'CUDA out of memory' >&2\nexit 3\n");
        let runner = sh_runner(dir.path(), 1, None);

        let err = runner.run(ScriptJob::new("GFPGAN", "fail.py")).await.unwrap_err();
        assert!(matches!(err, ModelError::ProcessFailed { ref code, .. } if code == "3"));
        let msg = err.to_string();
        assert!(msg.starts_with("GFPGAN process exited with code 3: "), "{msg}");
        assert!(msg.contains("CUDA out of memory"));
    }

    #[tokio::test]
    async fn test_json_output_parse_error() {
        let out = ScriptOutput { stdout: "not json".into(), stderr: String::new() };
        let err = out.json("DECA").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse DECA output:"));

        let ok = ScriptOutput { stdout: " {\"faces\": 2}\n".into(), stderr: String::new() };
        assert_eq!(ok.json("DECA").unwrap()["faces"], 2);
    }

    #[tokio::test]
    async fn test_timeout_kills_job() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "slow.py", "sleep 5\n");
        let runner = sh_runner(dir.path(), 1, Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = runner.run(ScriptJob::new("StyleGAN3", "slow.py")).await.unwrap_err();
        assert!(matches!(err, ModelError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(runner.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptRunner::new(
            "/nonexistent/knoux-python",
            dir.path(),
            dir.path().join("tmp"),
            RunnerLimits { max_concurrent: 1, timeout: None },
        );
        let err = runner.run(ScriptJob::new("Wav2Lip", "x.py")).await.unwrap_err();
        assert!(matches!(err, ModelError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_pool_serializes_jobs() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "nap.py", "sleep 0.3\necho done\n");
        let runner = Arc::new(sh_runner(dir.path(), 1, None));

        let started = Instant::now();
        let a = tokio::spawn({
            let r = runner.clone();
            async move { r.run(ScriptJob::new("A", "nap.py")).await }
        });
        let b = tokio::spawn({
            let r = runner.clone();
            async move { r.run(ScriptJob::new("B", "nap.py")).await }
        });
        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        assert!(
            started.elapsed() >= Duration::from_millis(550),
            "jobs overlapped: {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn test_output_path_shape() {
        let dir = tempfile::tempdir().unwrap();
        let runner = sh_runner(dir.path(), 1, None);
        let a = runner.output_path("lipsync", "mp4").await.unwrap();
        let b = runner.output_path("lipsync", "mp4").await.unwrap();

        assert!(dir.path().join("tmp").is_dir());
        assert_ne!(a, b);
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("lipsync_") && name.ends_with(".mp4"), "{name}");
    }

    #[test]
    fn test_display_arg_formatting() {
        assert_eq!(display_arg(&serde_json::json!(1)), "1");
        assert_eq!(display_arg(&serde_json::json!(-0.25)), "-0.25");
        assert_eq!(display_arg(&serde_json::json!("0.5")), "0.5");
        assert_eq!(display_arg(&Value::Null), "");
        assert_eq!(display_arg(&serde_json::json!(true)), "true");
    }

    #[test]
    fn test_job_builder() {
        let job = ScriptJob::new("DECA", "deca_capture.py")
            .flag("--input", "a.png")
            .path_flag("--model_path", Path::new("m/deca.pkl"));
        assert_eq!(job.args, vec!["--input", "a.png", "--model_path", "m/deca.pkl"]);
    }
}
