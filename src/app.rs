use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::config::Config;
use crate::error::panic_response;
use crate::handlers::{method_not_allowed, not_found, nurses_by_city, root};
use crate::state::{AppState, DataStore, SharedState};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum router over an already constructed state.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    let routes = Router::new()
        .route("/", get(root).fallback(method_not_allowed))
        .route(
            "/nurses/{city}",
            get(nurses_by_city).fallback(method_not_allowed),
        );

    with_middleware(routes).with_state(shared)
}

/// JSON 404 fallback, panic boundary and CORS, outermost last.
fn with_middleware<S>(routes: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::very_permissive())
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Load the dataset, then serve until Ctrl-C.
///
/// A failed startup load is not fatal: the first request retries it.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = DataStore::new(&config.data_file);
    if !store.load().await {
        log::error!("Failed to load data during startup");
    }

    let app = build_router(AppState::new(store));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Nurse finder listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
