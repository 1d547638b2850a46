use cortado_server::{routes, utils, Config, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment first so config and logging see .env values
    dotenv::dotenv().ok();

    let config = Config::from_env();
    utils::logger::init_logger(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Cortado server starting"
    );

    let state = ServerState::initialize(config.clone())?;
    let app = routes::build_app(state);

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!(addr = %config.addr(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Cortado server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
