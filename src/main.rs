//! fatbot-relay binary: load config, start the relay server.

use anyhow::{Context, Result};
use clap::Parser;
use fatbot_relay::{config::Config, server};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(
    name = "fatbot-relay",
    version,
    about = "Relay Nansen alert webhooks to Discord with FatBot trading links"
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    if config.signing_secret.is_none() {
        tracing::warn!("NANSEN_SECRET is unset: all inbound requests will be rejected");
    }
    if config.discord_webhook.is_none() {
        tracing::warn!("DISCORD_WEBHOOK is unset: messages will be dropped after processing");
    }

    server::run(cli.bind, config).await
}
