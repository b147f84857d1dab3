// Knoux Health Check & Watchdog
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Two halves:
//   * `check_dependencies` answers "can this host run the models?" on demand
//     (interpreter, scripts, weights, job pool occupancy).
//   * `HealthMonitor` is a background heartbeat watching memory pressure and
//     whether the scratch directory is still writable.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::SystemExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::RuntimeConfig;
use crate::models::{ModelKind, ScriptRunner};

const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Health status of a subsystem
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum SubsystemStatus {
    Healthy,
    Degraded(String),
    Down(String),
}

impl SubsystemStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, SubsystemStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelHealth {
    pub id: &'static str,
    pub name: &'static str,
    pub status: SubsystemStatus,
    pub missing: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub overall: SubsystemStatus,
    pub python: SubsystemStatus,
    pub python_version: Option<String>,
    pub models: Vec<ModelHealth>,
    pub in_flight: usize,
    pub max_concurrent: usize,
    pub uptime_secs: u64,
}

pub async fn check_dependencies(config: &RuntimeConfig, runner: &ScriptRunner, uptime_secs: u64) -> HealthReport {
    let (python, python_version) = probe_interpreter(&config.python).await;

    let paths = config.model_paths();
    let models: Vec<ModelHealth> = ModelKind::ALL
        .iter()
        .map(|&kind| {
            let mut required: Vec<PathBuf> = kind
                .scripts()
                .iter()
                .map(|s| config.scripts_dir.join(s))
                .collect();
            required.extend(paths.weights_for(kind).into_iter().map(Path::to_path_buf));

            let missing: Vec<PathBuf> = required.into_iter().filter(|p| !p.exists()).collect();
            let status = if missing.is_empty() {
                SubsystemStatus::Healthy
            } else {
                SubsystemStatus::Degraded(format!("{} required file(s) missing", missing.len()))
            };
            let cfg = kind.config();
            ModelHealth { id: cfg.id, name: cfg.name, status, missing }
        })
        .collect();

    let overall = if let SubsystemStatus::Down(reason) = &python {
        SubsystemStatus::Down(format!("python: {}", reason))
    } else if models.iter().all(|m| m.status.is_healthy()) {
        SubsystemStatus::Healthy
    } else {
        let n = models.iter().filter(|m| !m.status.is_healthy()).count();
        SubsystemStatus::Degraded(format!("{} model(s) not ready", n))
    };

    HealthReport {
        overall,
        python,
        python_version,
        models,
        in_flight: runner.in_flight(),
        max_concurrent: runner.limits().max_concurrent,
        uptime_secs,
    }
}

/// Runs `<python> --version`. Older interpreters print it on stderr.
async fn probe_interpreter(python: &str) -> (SubsystemStatus, Option<String>) {
    let probe = Command::new(python)
        .arg("--version")
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(VERSION_PROBE_TIMEOUT, probe).await {
        Err(_) => (SubsystemStatus::Down("version probe timed out".into()), None),
        Ok(Err(e)) => (SubsystemStatus::Down(format!("cannot start '{}': {}", python, e)), None),
        Ok(Ok(out)) if !out.status.success() => (
            SubsystemStatus::Degraded(format!("'{} --version' exited with {}", python, out.status)),
            None,
        ),
        Ok(Ok(out)) => {
            let text = if out.stdout.is_empty() { &out.stderr } else { &out.stdout };
            let version = String::from_utf8_lossy(text).trim().to_string();
            (SubsystemStatus::Healthy, Some(version).filter(|v| !v.is_empty()))
        }
    }
}

/// Background heartbeat for the server process.
pub struct HealthMonitor {
    start_time: Instant,
    is_running: Arc<AtomicBool>,
    // Bumped by every start and stop; a loop exits once it no longer matches.
    generation: Arc<AtomicU64>,
    heartbeat_count: Arc<AtomicU64>,
    pressure_events: Arc<AtomicU64>,
    check_interval: Duration,
    scratch_dir: PathBuf,
}

impl HealthMonitor {
    pub fn new(check_interval: Duration, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_time: Instant::now(),
            is_running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            heartbeat_count: Arc::new(AtomicU64::new(0)),
            pressure_events: Arc::new(AtomicU64::new(0)),
            check_interval,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn heartbeat_count(&self) -> u64 {
        self.heartbeat_count.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Spawns the heartbeat loop. Returns `None` if one is already running.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return None;
        }
        let run_id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let heartbeat_count = self.heartbeat_count.clone();
        let pressure_events = self.pressure_events.clone();
        let interval = self.check_interval;
        let scratch = self.scratch_dir.clone();

        Some(tokio::spawn(async move {
            info!("[HEALTH] Watchdog started (interval: {:?})", interval);

            loop {
                tokio::time::sleep(interval).await;
                if generation.load(Ordering::SeqCst) != run_id {
                    break;
                }
                let count = heartbeat_count.fetch_add(1, Ordering::Relaxed) + 1;

                let mem_ok = check_memory_health();
                let disk_ok = check_scratch_writable(&scratch).await;

                if !mem_ok {
                    pressure_events.fetch_add(1, Ordering::Relaxed);
                    warn!("[HEALTH] Memory pressure detected (heartbeat #{})", count);
                }
                if !disk_ok {
                    warn!("[HEALTH] Scratch dir {:?} not writable (heartbeat #{})", scratch, count);
                }

                if count % 60 == 0 {
                    info!(
                        "[HEALTH] Alive | Heartbeat #{} | Memory: {} | Scratch: {}",
                        count,
                        if mem_ok { "OK" } else { "WARN" },
                        if disk_ok { "OK" } else { "WARN" },
                    );
                }
            }

            info!("[HEALTH] Watchdog stopped.");
        }))
    }

    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.is_running.store(false, Ordering::SeqCst);
        info!("[HEALTH] Shutdown requested.");
    }

    pub fn status_report(&self) -> String {
        let uptime = self.uptime_secs();
        format!(
            "Knoux Health Report\n  Uptime: {}h {}m {}s\n  Heartbeats: {}\n  Memory pressure events: {}\n  Status: {}",
            uptime / 3600,
            (uptime % 3600) / 60,
            uptime % 60,
            self.heartbeat_count(),
            self.pressure_events.load(Ordering::Relaxed),
            if self.is_running() { "MONITORING" } else { "STOPPED" },
        )
    }
}

fn check_memory_health() -> bool {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    if total == 0 {
        return true;
    }
    (sys.used_memory() as f64 / total as f64) < 0.95
}

async fn check_scratch_writable(dir: &Path) -> bool {
    let probe = dir.join(".knoux_health_check");
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await
    }
    .await;
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("[HEALTH] Scratch write check failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunnerLimits;

    fn config_in(dir: &Path, python: &str) -> RuntimeConfig {
        RuntimeConfig {
            python: python.to_string(),
            scripts_dir: dir.join("scripts"),
            models_dir: dir.join("weights"),
            tmp_dir: dir.join("tmp"),
            ..RuntimeConfig::default()
        }
    }

    fn runner_for(config: &RuntimeConfig) -> ScriptRunner {
        ScriptRunner::new(
            config.python.clone(),
            config.scripts_dir.clone(),
            config.tmp_dir.clone(),
            RunnerLimits { max_concurrent: 2, timeout: None },
        )
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "knoux-no-such-python");
        let report = check_dependencies(&config, &runner_for(&config), 7).await;

        assert!(matches!(report.python, SubsystemStatus::Down(_)));
        assert!(matches!(report.overall, SubsystemStatus::Down(_)));
        assert_eq!(report.max_concurrent, 2);
        assert_eq!(report.uptime_secs, 7);
        assert_eq!(report.models.len(), ModelKind::ALL.len());
        assert!(report.models.iter().all(|m| !m.missing.is_empty()));
    }

    #[tokio::test]
    async fn test_model_ready_when_files_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "knoux-no-such-python");
        let paths = config.model_paths();

        std::fs::create_dir_all(&config.scripts_dir).unwrap();
        std::fs::write(config.scripts_dir.join("gfpgan_inference.py"), "").unwrap();
        std::fs::create_dir_all(paths.gfpgan.parent().unwrap()).unwrap();
        std::fs::write(&paths.gfpgan, "").unwrap();

        let report = check_dependencies(&config, &runner_for(&config), 0).await;
        let gfpgan = report.models.iter().find(|m| m.id == "gfpgan").unwrap();
        assert_eq!(gfpgan.status, SubsystemStatus::Healthy);
        let deca = report.models.iter().find(|m| m.id == "deca").unwrap();
        assert!(matches!(deca.status, SubsystemStatus::Degraded(_)));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(SubsystemStatus::Degraded("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "degraded", "detail": "x" }));
        let json = serde_json::to_value(SubsystemStatus::Healthy).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_monitor_heartbeat() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = HealthMonitor::new(Duration::from_millis(20), dir.path());
        assert!(monitor.status_report().contains("STOPPED"));

        monitor.start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(monitor.is_running());
        assert!(monitor.heartbeat_count() >= 1);

        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_restart_retires_previous_loop() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = HealthMonitor::new(Duration::from_millis(20), dir.path());

        let first = monitor.start().unwrap();
        assert!(monitor.start().is_none());
        monitor.stop();
        let second = monitor.start().unwrap();

        tokio::time::timeout(Duration::from_secs(2), first)
            .await
            .expect("old heartbeat loop kept running")
            .unwrap();
        assert!(!second.is_finished());
        monitor.stop();
    }
}
