//! Courtside Back binary entrypoint wiring REST, SSE and storage layers.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside_back::{
    config::GameRules,
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let rules = GameRules::load();
    let app_state = AppState::new(rules);

    spawn_storage(app_state.clone()).await;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Wire up the storage backend: MongoDB under supervision when a URI is
/// configured, an in-memory store otherwise.
async fn spawn_storage(state: SharedState) {
    #[cfg(feature = "mongo-store")]
    if let Ok(uri) = env::var("MONGO_URI") {
        use std::sync::Arc;

        use courtside_back::dao::game_store::{GameStore, mongodb};

        let db_name = env::var("MONGO_DB").ok();
        tokio::spawn(storage_supervisor::run(state, move || {
            let uri = uri.clone();
            let db_name = db_name.clone();
            async move {
                let config = mongodb::MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
                let store = mongodb::MongoGameStore::connect(config).await?;
                Ok(Arc::new(store) as Arc<dyn GameStore>)
            }
        }));
        return;
    }

    {
        use std::sync::Arc;

        use courtside_back::dao::game_store::memory::MemoryGameStore;

        info!("MONGO_URI not set; using the in-memory game store");
        state
            .install_game_store(Arc::new(MemoryGameStore::new()))
            .await;
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
