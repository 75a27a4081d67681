use std::sync::Arc;
use ws_keepalive::{KeepaliveClient, KeepaliveOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing to see heartbeat and reconnect logs
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ws_keepalive=debug,info".into()),
        )
        .init();

    let base_url =
        std::env::var("KEEPALIVE_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let address = std::env::var("KEEPALIVE_ADDRESS").ok();

    let client = KeepaliveClient::new(KeepaliveOptions {
        base_url: Some(base_url.clone()),
        ..Default::default()
    })?;

    println!("Connecting to {}...", base_url);
    client.connect(
        address.as_deref(),
        Some(Arc::new(|text: String| println!("<- {}", text))),
    )?;

    // Keep connection alive; drop the network to watch it reconnect
    tokio::signal::ctrl_c().await?;

    println!("Disconnecting...");
    client.shutdown().await?;
    println!("Disconnected!");

    Ok(())
}
