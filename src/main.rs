//! src/main.rs
use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use randomatched_server::config::Config;

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("randomatched_server=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "listening on {} ({} players per generation)",
        config.bind_addr, config.player_count
    );

    randomatched_server::run_with(&config).await?.await?;
    Ok(())
}
