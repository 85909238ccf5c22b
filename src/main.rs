use dirtree::background;
use dirtree::config::AppConfig;
use dirtree::persistence;
use dirtree::persistence::wal::WalWriter;
use dirtree::routes;
use dirtree::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting dirtree v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(config.blobs_dir()).expect("Failed to create blobs dir");
    std::fs::create_dir_all(config.metadata_dir()).expect("Failed to create metadata dir");

    let wal_writer = WalWriter::open(&config.wal_dir()).expect("Failed to open WAL");
    let state = AppState::new(config.clone(), wal_writer).expect("Failed to build app state");

    // Boot recovery: load snapshot, then replay WAL
    if let Some(snapshot) = persistence::snapshot::load_snapshot(&config.snapshot_path())
        .expect("Failed to load snapshot")
    {
        tracing::info!(
            directories = snapshot.directories.len(),
            files = snapshot.files.len(),
            wal_seq = snapshot.wal_seq,
            "Loaded snapshot from {}",
            snapshot.timestamp
        );
        state.tree.restore(snapshot);
    }

    match WalWriter::read_entries(&config.wal_dir()) {
        Ok(records) => {
            if !records.is_empty() {
                tracing::info!(count = records.len(), "Replaying WAL entries");
                for record in records {
                    state.tree.replay(record);
                }
            }
        }
        Err(e) => {
            tracing::error!("Failed to read WAL entries: {}", e);
        }
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let snapshot_handle = tokio::spawn(background::snapshot_writer::run(
        state.clone(),
        shutdown_rx,
    ));

    let app = routes::build_router(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .expect("Server error");

    let _ = snapshot_handle.await;

    tracing::info!("Writing final snapshot");
    background::snapshot_writer::write_snapshot(&state).await;

    tracing::info!("Shutdown complete");
}

async fn shutdown_signal(shutdown_tx: tokio::sync::watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}
