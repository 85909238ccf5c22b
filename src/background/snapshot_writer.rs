use crate::state::AppState;
use std::time::Duration;
use tokio::sync::watch;

pub async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(state.config.snapshot_interval_secs);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                tracing::info!("Snapshot writer shutting down");
                return;
            }
        }

        write_snapshot(&state).await;
    }
}

pub async fn write_snapshot(state: &AppState) {
    let tree = state.tree.clone();
    let snapshot_path = state.config.snapshot_path();

    // Checkpointing is blocking file I/O under the store's write lock.
    let result = tokio::task::spawn_blocking(move || tree.checkpoint(&snapshot_path)).await;

    match result {
        Ok(Ok(absorbed)) => {
            tracing::info!(wal_entries = absorbed, "Snapshot written successfully");
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to write snapshot: {}", e);
        }
        Err(e) => {
            tracing::error!("Snapshot task panicked: {}", e);
        }
    }
}
