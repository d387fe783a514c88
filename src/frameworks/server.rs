// Framework bootstrap for the simulation server runtime.

use crate::domain::{Rect, Universe, UniverseConfig};
use crate::frameworks::config;
use crate::interface_adapters::http::index_handler;
use crate::interface_adapters::net::{SessionHub, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{WorldSettings, world_task};

use axum::{Router, routing::get};
use std::future::Future;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc, time::Duration};
use tokio::sync::Notify;

/// Everything needed to stand up one server instance.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bounds: Rect,
    pub seed: Option<u64>,
    pub initial_bodies: usize,
    pub command_capacity: usize,
    pub outbound_capacity: usize,
    pub world: WorldSettings,
    pub shutdown_drain: Duration,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        Self {
            bounds: config::UNIVERSE_BOUNDS,
            seed: config::universe_seed(),
            initial_bodies: config::initial_bodies(),
            command_capacity: config::COMMAND_QUEUE_CAPACITY,
            outbound_capacity: config::SESSION_OUTBOUND_CAPACITY,
            world: WorldSettings {
                tick_interval: config::TICK_INTERVAL,
                threat_spawn_interval: config::THREAT_SPAWN_INTERVAL,
                food_spawn_interval: config::FOOD_SPAWN_INTERVAL,
            },
            shutdown_drain: config::shutdown_drain(),
        }
    }
}

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

/// Serves until ctrl-c using settings from the environment.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    serve(listener, ServerSettings::from_env(), shutdown_signal()).await
}

/// Serves until `shutdown` resolves, then stops the tick loop and drains every session.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    settings: ServerSettings,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;

    // Build the universe and seed it before the first tick.
    let mut universe = Universe::new(UniverseConfig {
        command_capacity: settings.command_capacity,
        seed: settings.seed,
        ..UniverseConfig::new(settings.bounds)
    });
    universe.seed_random_bodies(settings.initial_bodies);

    let sessions = Arc::new(SessionHub::new());
    let state = Arc::new(AppState {
        commands: universe.command_sender(),
        sessions: sessions.clone(),
        outbound_capacity: settings.outbound_capacity,
    });

    // Spawn the world task; it is the only owner of the universe.
    let world_shutdown = Arc::new(Notify::new());
    let world = tokio::spawn(world_task(
        universe,
        sessions.clone(),
        settings.world,
        world_shutdown.clone(),
    ));

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/game", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    let drain = settings.shutdown_drain;
    let graceful = async move {
        shutdown.await;
        tracing::info!("shutdown requested");

        // Stop ticking first so no snapshot races the session teardown.
        world_shutdown.notify_one();
        match world.await {
            Ok(universe) => {
                tracing::info!(bodies = universe.bodies().len(), "world stopped");
            }
            Err(e) => tracing::error!(error = %e, "world task failed"),
        }
        sessions.close_all(drain).await;
    };

    // Serve app and report errors rather than panicking
    axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until the process is killed.
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
