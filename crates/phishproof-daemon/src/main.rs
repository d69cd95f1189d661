//! phishproof-daemon: the domain threat detection daemon.
//!
//! Single OS process running a Tokio async runtime. Clients talk to
//! the daemon via JSON-RPC over a Unix socket; three background tasks
//! keep the trusted-domain corpus fresh and the decision states swept.

mod commands;
mod config;
mod rpc;
mod scheduler;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

use phishproof_ingest::{FsObjectStore, HttpListProvider, IngestPipeline};
use phishproof_match::MatchConfig;
use phishproof_state::{DecisionEngine, StateManager};

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection.
    pub db: Arc<Mutex<rusqlite::Connection>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Matching-engine configuration.
    pub match_cfg: Arc<MatchConfig>,
    /// Ingestion pipeline.
    pub pipeline: IngestPipeline<HttpListProvider, FsObjectStore>,
    /// Decision-state manager.
    pub states: StateManager,
    /// Stateful query orchestration.
    pub decisions: DecisionEngine,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config; an invalid TTL or batch size dies here.
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("phishproof={}", config.log.level).parse()?),
        )
        .init();

    info!("phishproof daemon starting");

    let data_dir = DaemonConfig::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Open database
    let db_path = data_dir.join("phishproof.db");
    let conn = phishproof_db::open(&db_path)?;
    let db = Arc::new(Mutex::new(conn));

    // 4. Build collaborators
    let provider =
        HttpListProvider::new(config.ingest.provider_base_url.clone(), config.request_timeout())?;
    let objects = FsObjectStore::new(config.bucket_dir())?;
    let pipeline = IngestPipeline::new(
        provider,
        objects,
        config.retry_policy(),
        config.pipeline_config(),
    );

    let match_cfg = Arc::new(config.match_config());
    let states = StateManager::new(config.state_ttl()?);
    let decisions = DecisionEngine::new(
        states.clone(),
        Arc::clone(&match_cfg),
        config.state.deny_policy,
    );

    // 5. Create shutdown channel
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    // 6. Build daemon state
    let state = Arc::new(DaemonState {
        db,
        config,
        match_cfg,
        pipeline,
        states,
        decisions,
        shutdown_tx: shutdown_tx.clone(),
    });

    // 7. Start background tasks
    let background = scheduler::spawn_all(Arc::clone(&state));

    // 8. Start RPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(Arc::clone(&state), socket_path.clone());
    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 9. Run until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");
    for task in background {
        task.abort();
    }
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
