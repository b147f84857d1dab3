// Knoux Server State
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::sync::Arc;
use std::time::Duration;

use crate::config::RuntimeConfig;
use crate::engine::{EventBus, ProjectEngine, ProjectStore};
use crate::health::HealthMonitor;
use crate::models::ModelSuite;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

pub struct AppState {
    pub config: RuntimeConfig,
    pub models: ModelSuite,
    pub projects: ProjectEngine,
    pub events: EventBus,
    pub monitor: HealthMonitor,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: RuntimeConfig) -> Self {
        let events = EventBus::new();
        Self {
            models: ModelSuite::from_config(&config),
            projects: ProjectEngine::new(ProjectStore::new(&config.projects_dir), events.clone()),
            monitor: HealthMonitor::new(HEARTBEAT_INTERVAL, &config.tmp_dir),
            events,
            config,
        }
    }

    pub fn shared(config: RuntimeConfig) -> SharedState {
        Arc::new(Self::new(config))
    }
}
