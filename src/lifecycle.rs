use crate::repository::{NoteStore, StoreError};

/// Runs once before the listener is bound. Any error here is fatal.
pub async fn startup(store: &dyn NoteStore) -> Result<(), StoreError> {
    store.init_schema().await?;
    tracing::info!("Database schema initialised");
    Ok(())
}

/// Runs after the server has drained its connections.
pub async fn shutdown(store: &dyn NoteStore) {
    store.close().await;
    tracing::info!("Shutdown complete");
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
