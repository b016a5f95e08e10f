//! Listener and shutdown handling.

use memoria_error::{MemoriaResult, ServerError, ServerErrorKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{AppState, router};

/// Serve the API on `bind` until Ctrl-C.
///
/// On shutdown the state's cancellation token fires, so a running bulk restyle
/// stops after its current item.
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server loop fails.
#[instrument(skip(state))]
pub async fn serve(state: AppState, bind: &str) -> MemoriaResult<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Bind(format!("{}: {}", bind, e))))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::new(ServerErrorKind::Bind(e.to_string())))?;
    info!(addr = %local_addr, "Memoria listening");

    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Serve(e.to_string())))?;

    info!("Memoria stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Could not listen for Ctrl-C");
                shutdown.cancelled().await;
            }
        }
        _ = shutdown.cancelled() => {}
    }
    info!("Shutting down");
    shutdown.cancel();
}
