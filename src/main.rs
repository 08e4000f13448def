//! MedCare gateway
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│ Logging  │───▶│   Seed   │───▶│ Gateway  │
//! │  (YAML)  │    │(tracing) │    │ (YAML)   │    │  (axum)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage: `medcare [--env dev] [--port 8000]`

use std::sync::Arc;

use anyhow::Context;

use medcare::config::AppConfig;
use medcare::gateway::{self, AppState};
use medcare::logging::init_logging;
use medcare::seed::SeedFile;
use medcare::store::MemoryStore;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = init_logging(&app_config)?;

    tracing::info!(
        env = %env,
        build = env!("GIT_HASH"),
        "Starting MedCare gateway"
    );

    let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));

    if let Some(path) = &app_config.seed_file {
        SeedFile::load(path)?
            .apply(&state.census)
            .with_context(|| format!("Failed to apply seed file: {}", path.display()))?;
    }

    gateway::run_server(&app_config.gateway, state).await
}
