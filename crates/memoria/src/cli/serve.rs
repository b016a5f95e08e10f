//! Server command handler.

use memoria::{AppState, MemoriaConfig, MemoriaResult, serve};

/// Open all components and serve the HTTP API until Ctrl-C.
pub async fn run_server(bind: Option<String>, config: &MemoriaConfig) -> MemoriaResult<()> {
    let state = AppState::from_config(config).await?;
    let bind = bind.unwrap_or_else(|| config.server().bind().clone());
    serve(state, &bind).await
}
