use std::net::SocketAddr;

use clap::Parser;
use tracing::info;

use pizza_common::fixtures;
use pizza_mock::{MockServer, MockServerConfig};

/// Serve the JWT Pizza mock backend for manual storefront runs
#[derive(Parser, Debug)]
#[command(name = "pizza-mock")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "PIZZA_MOCK_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Email of a fixture identity the session starts logged in as
    #[arg(long, env = "PIZZA_MOCK_LOGIN_AS")]
    login_as: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = fixtures::resolve_seed_identity(args.login_as.as_deref())?;

    let server = MockServer::start(MockServerConfig {
        bind_addr: args.addr,
        seed,
    })
    .await?;

    info!("Serving mock backend at {} (ctrl-c to stop)", server.base_url());
    tokio::signal::ctrl_c().await?;

    server.shutdown().await?;
    Ok(())
}
