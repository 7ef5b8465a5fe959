//! SignBridge - sign language recognition server
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP API (default)
//! cargo run --release
//!
//! # Use a specific config file and bind address
//! ./signbridge --config signbridge.toml --addr 127.0.0.1:5000
//!
//! # Fit models from recorded samples without starting the server
//! ./signbridge train static
//! ./signbridge train dynamic --data-dir static/training_data
//!
//! # Check a config file
//! ./signbridge check-config --config signbridge.toml
//! ```
//!
//! # Environment Variables
//!
//! - `SIGNBRIDGE_CONFIG`: Path to the TOML config file
//! - `SIGNBRIDGE_SERVER_ADDR`: Bind address override
//! - `SIGNBRIDGE_CORS_ORIGINS`: Comma-separated allowed origins
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use signbridge::api::{create_app, ApiState};
use signbridge::config::{self, AppConfig};
use signbridge::landmarks::SidecarLandmarker;
use signbridge::pipeline::Recognizer;
use signbridge::temporal::session::run_session_sweeper;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "signbridge")]
#[command(about = "SignBridge sign language recognition server")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:5000")
    #[arg(short, long, env = "SIGNBRIDGE_SERVER_ADDR")]
    addr: Option<String>,

    /// Config file (otherwise SIGNBRIDGE_CONFIG, then ./signbridge.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Fit a model from recorded samples, save it, and exit
    Train {
        #[arg(value_enum)]
        kind: TrainKind,

        /// Sample directory (default: training.data_dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TrainKind {
    Static,
    Dynamic,
}

// ============================================================================
// Task Management
// ============================================================================

#[derive(Debug)]
enum TaskName {
    HttpServer,
    SessionSweeper,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::SessionSweeper => write!(f, "SessionSweeper"),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(AppConfig::load()),
    }
}

fn build_recognizer(cfg: &AppConfig) -> Arc<Recognizer> {
    let landmarker = Arc::new(SidecarLandmarker::new(
        cfg.landmarks.command.clone(),
        cfg.landmarks.args.clone(),
    ));
    // Start the helper early so the first frame does not pay for model load
    if let Err(e) = landmarker.warm_up() {
        warn!(error = %e, "Landmark helper unavailable, frames will report no hand until it starts");
    }
    Arc::new(Recognizer::initialize(cfg, landmarker))
}

// ============================================================================
// Offline Commands
// ============================================================================

fn run_train(cfg: &AppConfig, kind: TrainKind, data_dir: Option<PathBuf>) -> Result<()> {
    let dir = data_dir.unwrap_or_else(|| cfg.training.data_dir.clone());
    let recognizer = build_recognizer(cfg);
    let ok = match kind {
        TrainKind::Static => recognizer.train_static_model(&dir),
        TrainKind::Dynamic => recognizer.train_dynamic_model(&dir),
    };
    if ok {
        info!("✓ Training complete");
        Ok(())
    } else {
        Err(anyhow::anyhow!("training failed, see log for details"))
    }
}

// ============================================================================
// Server
// ============================================================================

async fn run_server(cfg: &AppConfig, server_addr: String) -> Result<()> {
    let recognizer = build_recognizer(cfg);

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Idle session eviction
    let sessions = Arc::clone(recognizer.sessions());
    let idle_timeout = cfg.sessions.idle_timeout();
    let sweep_interval = cfg.sessions.sweep_interval();
    let sweeper_token = cancel_token.clone();
    task_set.spawn(async move {
        run_session_sweeper(sessions, idle_timeout, sweep_interval, sweeper_token).await;
        Ok(TaskName::SessionSweeper)
    });

    // HTTP server
    let state = ApiState::new(Arc::clone(&recognizer), cfg.training.data_dir.clone());
    let app = create_app(state, cfg.server.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;
    info!("✓ HTTP server listening on {}", server_addr);

    let server_token = cancel_token.clone();
    task_set.spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;
        match result {
            Ok(()) => Ok(TaskName::HttpServer),
            Err(e) => Err(anyhow::anyhow!("HTTP server error: {}", e)),
        }
    });

    // Any task ending brings the rest down
    let mut first_error = None;
    while let Some(joined) = task_set.join_next().await {
        match joined {
            Ok(Ok(name)) => info!("[{}] Task finished", name),
            Ok(Err(e)) => {
                error!("Task failed: {}", e);
                first_error.get_or_insert(e);
            }
            Err(e) => {
                error!("Task panicked: {}", e);
                first_error.get_or_insert(anyhow::anyhow!("task panicked: {}", e));
            }
        }
        cancel_token.cancel();
    }

    info!("{}", recognizer.stats());
    first_error.map_or(Ok(()), Err)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let cfg = load_config(args.config.as_ref())?;

    if let Some(SubCommand::CheckConfig) = &args.command {
        cfg.validate()?;
        println!("{}", cfg.to_toml()?);
        info!("✓ Configuration is valid");
        return Ok(());
    }

    config::init(cfg.clone());

    if let Some(SubCommand::Train { kind, data_dir }) = args.command {
        return run_train(config::get(), kind, data_dir);
    }

    let server_addr = args.addr.unwrap_or_else(|| cfg.server.addr.clone());

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  SignBridge - Sign Language Recognition");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "Buffer: {} frames | Dynamic gates: {} frames, {:.2}s span, {:.2}s cooldown",
        cfg.temporal.buffer_capacity,
        cfg.temporal.min_sequence_length,
        cfg.temporal.min_span_secs,
        cfg.temporal.prediction_cooldown_secs
    );

    run_server(config::get(), server_addr).await?;

    info!("✓ SignBridge shutdown complete");
    Ok(())
}
