//! Mock chat server binary.

use mock_chat::ServerConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        address = %addr,
        poll_timeout_secs = config.poll_timeout.as_secs(),
        history = config.history_limit,
        "mock chat server listening"
    );
    mock_chat::serve(listener, config).await?;
    Ok(())
}
