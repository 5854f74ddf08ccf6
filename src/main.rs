//! portal-assist HTTP server
//!
//! Starts an Axum web server exposing /chat, /exam-summary, /health and /metrics.

use clap::Parser;
use portal_assist::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        config_path = %cli.config,
        "Starting portal-assist server on {}:{}",
        config.server.host,
        config.server.port
    );

    let host = config.server.host.parse::<std::net::IpAddr>().unwrap_or_else(|e| {
        tracing::warn!(
            host = %config.server.host,
            error = %e,
            "Invalid server.host, binding to 0.0.0.0"
        );
        std::net::IpAddr::from([0, 0, 0, 0])
    });
    let addr = SocketAddr::from((host, config.server.port));

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
