use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use szkic_backend::http::routes::{self, AppState};
use szkic_backend::{auth, config, telemetry, ws};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    auth::init_key();

    let state = AppState::new();

    // reap finished games and stale lobbies in the background
    tokio::spawn({
        let state = state.clone();
        async move {
            loop {
                tokio::time::sleep(Duration::from_secs(600)).await;
                state.prune(Duration::from_secs(3600));
            }
        }
    });

    let app = Router::new()
        .route("/healthz", get(routes::health))
        .route("/api/solo", post(routes::create_solo))
        .route("/api/lobby", post(routes::create_lobby))
        .route("/api/lobbies", get(routes::list_lobbies))
        .route("/api/lobby/:id/join", post(routes::join_lobby))
        .route("/api/stats/:player_id", get(routes::player_stats))
        .route("/api/room/:id/ws", get(ws::connection::ws_handler))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config::server_addr();
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
