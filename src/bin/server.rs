use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use quorumkv::api::{abd_router, blocking_router, AbdReplicaState, BlockingReplicaState, Metrics};
use quorumkv::config::{ClusterConfig, Protocol};
use quorumkv::store::{AbdStore, BlockingStore};

#[derive(Parser, Debug)]
#[command(name = "quorumkv-server", about = "quorumkv replica server")]
struct CliArgs {
    #[arg(long)]
    config: PathBuf,

    #[arg(long)]
    server_id: i32,

    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = CliArgs::parse();
    let config = ClusterConfig::load(&args.config)?;
    let me = config
        .server(args.server_id)
        .with_context(|| format!("server id {} not in config", args.server_id))?;
    let port = args.port.unwrap_or(me.port);

    // Bind all interfaces; the host in the config entry is the name clients
    // dial, not the bind address.
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        server_id = args.server_id,
        %addr,
        protocol = ?config.protocol,
        "replica starting"
    );

    match config.protocol {
        Protocol::Abd => {
            let state = AbdReplicaState {
                store: Arc::new(AbdStore::new()),
                metrics: Metrics::new(),
            };
            axum::serve(listener, abd_router(state)).await?;
        }
        Protocol::Blocking => {
            let state = BlockingReplicaState {
                store: Arc::new(BlockingStore::new()),
                metrics: Metrics::new(),
            };
            axum::serve(listener, blocking_router(state)).await?;
        }
    }

    Ok(())
}
