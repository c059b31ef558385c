// Framework bootstrap for the arena server runtime.

use crate::domain::ports::SnapshotStore;
use crate::domain::tuning::Tuning;
use crate::frameworks::config;
use crate::interface_adapters::net::{create_session_handler, spawn_session_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::storage::{InMemorySnapshotStore, JsonFileSnapshotStore};
use crate::interface_adapters::utils::rng::rand_seed;
use crate::use_cases::{SessionError, SessionRegistry, SessionSettings};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/sessions", post(create_session_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let store: Arc<dyn SnapshotStore> = match config::snapshot_dir() {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "persisting snapshots to disk");
            Arc::new(JsonFileSnapshotStore::new(dir))
        }
        None => Arc::new(InMemorySnapshotStore::new()),
    };

    let settings = SessionSettings {
        command_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        event_broadcast_capacity: config::EVENT_BROADCAST_CAPACITY,
        tick_interval: config::tick_interval(),
        persist_every_ticks: config::persist_every_ticks(),
        tuning: Tuning::default(),
    };
    tracing::debug!(
        tick_interval_ms = settings.tick_interval.as_millis(),
        persist_every_ticks = settings.persist_every_ticks,
        "session settings"
    );
    let sessions = Arc::new(SessionRegistry::new(settings, store));

    // The default session is always available for clients that do not create one.
    let default_session = sessions
        .create_session(config::DEFAULT_SESSION_ID.to_string(), rand_seed())
        .await
        .map_err(|e| match e {
            SessionError::AlreadyExists => {
                std::io::Error::other("default session created twice")
            }
            SessionError::Storage(err) => {
                std::io::Error::other(format!("failed to load default session: {err}"))
            }
        })?;
    spawn_session_serializer(&default_session);

    let admin_commands = config::admin_commands_enabled();
    if admin_commands {
        tracing::warn!("admin commands enabled");
    }

    Ok(Arc::new(AppState::new(
        sessions,
        config::DEFAULT_SESSION_ID,
        admin_commands,
    )))
}
