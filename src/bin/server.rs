use anyhow::Result;
use clap::Parser;
use epg_sku::config::AppConfig;
use epg_sku::http::app_server::AppServer;
use epg_sku::telemetry;
use epg_sku::SkuEngine;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sku-server", about = "EPG SKU allocation server")]
struct Cli {
    /// Path to config file
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let now = Instant::now();
    telemetry::init_telemetry().map_err(|e| anyhow::anyhow!(e))?;

    let cli = Cli::parse();

    tracing::info!("Starting EPG SKU server");

    let config = AppConfig::load(&cli.config)?;
    config.validate()?;

    tracing::info!("Configuration '{}' loaded successfully", &cli.config);

    let engine = SkuEngine::from_config(&config).await?;

    tracing::info!("Engine initialized");

    let app = AppServer::new(engine);
    let engine = app.engine.clone();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server started in {}ms", now.elapsed().as_millis());
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown())
        .await?;

    // Close the catalog pool before exiting
    if let Err(e) = engine.shutdown().await {
        tracing::error!("Error during engine shutdown: {}", e);
    }

    tracing::info!("Server shutdown complete");
    telemetry::shutdown_telemetry();

    Ok(())
}

async fn shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server...");
}
