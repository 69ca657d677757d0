//! ==============================================================================
//! main.rs - green grids host entry point
//! ==============================================================================
//!
//! purpose:
//!     the process behind the green grids smart agriculture dashboard. all
//!     data is simulated: there is no sensor bus and no inference model.
//!
//! responsibilities:
//!     - load host.toml and set up logging
//!     - start the live telemetry generator (5s cycle)
//!     - own the analysis service (3s simulated analysis)
//!     - serve the dashboard api
//!     - tear every background task down on ctrl-c
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                    rust host (this file)                     │
//!     │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//!     │  │ telemetry   │  │ web server  │  │ analysis service    │  │
//!     │  │ (5s cycle)  │  │ (port 3000) │  │ (one run in flight) │  │
//!     │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//!     │         │ writes         │ reads/commands     │             │
//!     │         ▼                ▼                    ▼             │
//!     │  Arc<RwLock<TelemetryState>>        AnalysisController      │
//!     └─────────────────────────────────────────────────────────────┘
//!
//! ==============================================================================

use greengrids::analyzer::SimulatedAnalyzer;
use greengrids::config::HostConfig;
use greengrids::report::DirectorySink;
use greengrids::sampler::RandomSampler;
use greengrids::server::{self, AppContext};
use greengrids::service::AnalysisService;
use greengrids::telemetry::{self, TelemetryGenerator};

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn sampler(seed: Option<u64>) -> RandomSampler {
    seed.map_or_else(RandomSampler::new, RandomSampler::seeded)
}

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Green Grids Host - Smart Agriculture Simulator");
    println!("===========================================================");

    // step 1: load configuration
    let config = HostConfig::load_or_default();
    config.print_summary();

    // step 2: logging (RUST_LOG wins over host.toml)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid logging.level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // step 3: telemetry state exists before the first tick
    let mut telemetry_sampler = sampler(config.telemetry.seed);
    let telemetry_state = Arc::new(RwLock::new(telemetry::initial_state(&mut telemetry_sampler)));
    let generator = TelemetryGenerator::spawn(
        telemetry_state.clone(),
        telemetry_sampler,
        config.telemetry.interval(),
        config.logging.show_sensor_data,
    );

    // step 4: analysis service
    let analyzer = SimulatedAnalyzer::new(config.analysis.delay(), sampler(config.analysis.seed));
    let analysis = AnalysisService::new(Arc::new(analyzer), config.analysis.timeout());
    info!("[STARTUP] ✓ Simulated analyzer ready ({}ms delay)", config.analysis.delay_ms);

    let ctx = AppContext {
        telemetry: telemetry_state,
        analysis: analysis.clone(),
        reports: Arc::new(DirectorySink::new(config.reports.output_dir.clone())),
    };

    // step 5: serve until ctrl-c
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("[ERROR] Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("[SHUTDOWN] ctrl-c received");
    };
    let served = server::run_server(ctx, &config.server.bind_addr, shutdown).await;

    // step 6: release background tasks
    generator.stop();
    analysis.shutdown().await;
    info!("[SHUTDOWN] background tasks stopped");

    served.with_context(|| format!("web server on {} failed", config.server.bind_addr))
}
