//! Mock identity provider service binary.

use anyhow::Context;
use mock_idp::config::Config;
use mock_idp::http::{self, AppState};
use mock_idp::keys::KeyManager;
use mock_idp::rotation::run_rotation;
use mock_idp::shutdown::{ShutdownCoordinator, shutdown_signal};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    rust_common::init_tracing(&config.tracing);

    info!(
        algorithm = %config.jwt_algorithm,
        issuer = %config.jwt_issuer,
        "Starting mock identity provider"
    );

    let key_settings = config.key_settings();
    let keys = tokio::task::spawn_blocking(move || KeyManager::generate(key_settings))
        .await
        .context("key generation task")?
        .context("generating initial signing key")?;
    let keys = Arc::new(keys);

    let coordinator = ShutdownCoordinator::new();
    let rotation = config.key_rotation_interval.map(|every| {
        tokio::spawn(run_rotation(
            Arc::clone(&keys),
            every,
            coordinator.subscribe(),
        ))
    });

    let state = Arc::new(AppState::new(Arc::clone(&keys), config.issuer_settings()));
    let app = http::router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, jwks = http::JWKS_PATH, "Mock identity provider listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    coordinator.trigger();
    if let Some(task) = rotation {
        task.await.context("joining key rotation task")?;
    }

    info!("Shutdown complete");
    Ok(())
}
