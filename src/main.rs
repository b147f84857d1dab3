// Knoux Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;

use knoux_core::ai_api::{self, AiAction};
use knoux_core::config::{self, RuntimeConfig};
use knoux_core::health::{self, SubsystemStatus};
use knoux_core::models::catalog;
use knoux_core::server;
use knoux_core::state::AppState;

#[derive(Parser)]
#[command(name = "knoux-core")]
#[command(about = "Knoux local AI model server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        runtime: RuntimeArgs,
    },

    /// List the model catalog
    Models {
        /// Only models with this capability (e.g. face-detection)
        #[arg(short, long)]
        capability: Option<String>,
    },

    /// Check interpreter, scripts and weights
    Check {
        #[command(flatten)]
        runtime: RuntimeArgs,
    },

    /// Run one model action directly, e.g. `run gfpgan enhance --body '{...}'`
    Run {
        model: String,
        action: String,

        /// JSON request body, same shape as the REST route
        #[arg(short, long, default_value = "{}")]
        body: String,

        #[command(flatten)]
        runtime: RuntimeArgs,
    },
}

/// Overrides on top of `.env` / environment settings.
#[derive(Args)]
struct RuntimeArgs {
    /// Python interpreter for the inference scripts
    #[arg(long)]
    python: Option<String>,

    #[arg(long)]
    scripts_dir: Option<PathBuf>,

    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Maximum inference jobs running at once
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Per-job timeout in seconds (0 disables it)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl RuntimeArgs {
    fn apply(self, mut cfg: RuntimeConfig) -> RuntimeConfig {
        if let Some(p) = self.python {
            cfg.python = p;
        }
        if let Some(d) = self.scripts_dir {
            cfg.scripts_dir = d;
        }
        if let Some(d) = self.models_dir {
            cfg.models_dir = d;
        }
        if let Some(n) = self.max_concurrent {
            cfg.max_concurrent = n.max(1);
        }
        if let Some(secs) = self.timeout_secs {
            cfg.job_timeout = config::timeout_from_secs(secs);
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Cli::parse();

    match args.command {
        Commands::Serve { port, runtime } => {
            let mut cfg = runtime.apply(RuntimeConfig::from_env());
            if let Some(p) = port {
                cfg.port = p;
            }
            info!(
                python = %cfg.python,
                max_concurrent = cfg.max_concurrent,
                timeout = ?cfg.job_timeout,
                "[SERVER] Starting"
            );
            let port = cfg.port;
            server::start_server(port, AppState::shared(cfg)).await?;
        }
        Commands::Models { capability } => {
            let models = match capability.as_deref() {
                Some(cap) => catalog::models_by_capability(cap),
                None => catalog::catalog(),
            };
            println!("{:<12} {:<30} {:<8} {:>7}  CAPABILITIES", "ID", "NAME", "VERSION", "MEM(MB)");
            for m in &models {
                println!(
                    "{:<12} {:<30} {:<8} {:>7}  {}",
                    m.id,
                    m.name,
                    m.version,
                    m.performance.memory_mb,
                    m.capabilities.join(", ")
                );
            }
            let ids: Vec<&str> = models.iter().map(|m| m.id).collect();
            println!("\nAll listed models loaded at once: ~{} MB", catalog::estimate_memory_usage(ids.as_slice()));
        }
        Commands::Check { runtime } => {
            let state = AppState::new(runtime.apply(RuntimeConfig::from_env()));
            let report = health::check_dependencies(&state.config, state.models.runner(), 0).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let SubsystemStatus::Down(reason) = &report.overall {
                bail!("Dependency check failed: {}", reason);
            }
        }
        Commands::Run { model, action, body, runtime } => {
            let Some(action) = AiAction::from_parts(&model, &action) else {
                bail!("Unknown model action: {}/{}", model, action);
            };
            let body: serde_json::Value = serde_json::from_str(&body).context("--body is not valid JSON")?;
            let state = AppState::new(runtime.apply(RuntimeConfig::from_env()));

            match ai_api::run_action(&state.models, &state.events, action, body).await {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "result": result }))?);
                }
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e.body())?);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
