use clap::Parser;
use std::sync::Arc;
use whatsapp_gateway::api::{self, ApiState};
use whatsapp_gateway::{Config, MemoryClientFactory, SessionRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let factory = Arc::new(MemoryClientFactory::default());
    let registry =
        SessionRegistry::new(factory, &config.data_dir).with_qr_printing(config.print_qr);

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Multi WhatsApp Web API listening");
    for (method, path, description) in api::ENDPOINTS {
        tracing::info!("  {method:<5} {path:<28} - {description}");
    }

    api::serve(listener, ApiState::new(registry.clone()), shutdown_signal()).await?;

    tracing::info!("shutting down, destroying active sessions");
    registry.shutdown_all().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for interrupt signal");
        std::future::pending::<()>().await;
    }
}
