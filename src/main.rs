use anyhow::Context;
use clap::Parser;
use miniredis::{config, Server, ServerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// In-memory server speaking a subset of the Redis protocol
#[derive(Parser, Debug)]
#[command(name = "miniredis-server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    bind: String,

    /// Number of selectable databases
    #[arg(short, long, default_value_t = config::DEFAULT_DATABASE_COUNT)]
    databases: usize,

    /// Maximum concurrent connections
    #[arg(short, long, default_value_t = config::DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = ServerConfig::new()
        .with_database_count(args.databases)
        .with_max_connections(args.max_connections);
    let server = Server::new(config).context("invalid configuration")?;

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    let handle = server.start(listener);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("Received Ctrl+C, initiating shutdown...");
    server.stop();

    handle.await.context("server task failed")?;
    tracing::info!("Server stopped");

    Ok(())
}
