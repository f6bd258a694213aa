// In-process cluster harness: each replica is a real axum server on an
// ephemeral port, with its store handle kept around so tests can inspect
// replica state directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use quorumkv::api::{abd_router, blocking_router, AbdReplicaState, BlockingReplicaState, Metrics};
use quorumkv::config::{ClusterConfig, Protocol, ServerInfo};
use quorumkv::store::{AbdStore, BlockingStore};

pub struct AbdCluster {
    pub config: ClusterConfig,
    pub stores: Vec<Arc<AbdStore>>,
}

pub struct BlockingCluster {
    pub config: ClusterConfig,
    pub stores: Vec<Arc<BlockingStore>>,
}

pub async fn spawn_abd_cluster(n: usize, read_quorum: usize, write_quorum: usize) -> AbdCluster {
    let mut servers = Vec::new();
    let mut stores = Vec::new();
    for id in 0..n {
        let store = Arc::new(AbdStore::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = AbdReplicaState {
            store: Arc::clone(&store),
            metrics: Metrics::new(),
        };
        tokio::spawn(async move {
            axum::serve(listener, abd_router(state)).await.unwrap();
        });
        servers.push(ServerInfo {
            id: id as i32,
            host: "127.0.0.1".to_string(),
            port,
        });
        stores.push(store);
    }
    AbdCluster {
        config: ClusterConfig {
            servers,
            protocol: Protocol::Abd,
            read_quorum,
            write_quorum,
            num_replicas: Some(n),
        },
        stores,
    }
}

pub async fn spawn_blocking_cluster(
    n: usize,
    read_quorum: usize,
    write_quorum: usize,
    lease_timeout: Duration,
) -> BlockingCluster {
    let mut servers = Vec::new();
    let mut stores = Vec::new();
    for id in 0..n {
        let store = Arc::new(BlockingStore::with_lease_timeout(lease_timeout));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = BlockingReplicaState {
            store: Arc::clone(&store),
            metrics: Metrics::new(),
        };
        tokio::spawn(async move {
            axum::serve(listener, blocking_router(state)).await.unwrap();
        });
        servers.push(ServerInfo {
            id: id as i32,
            host: "127.0.0.1".to_string(),
            port,
        });
        stores.push(store);
    }
    BlockingCluster {
        config: ClusterConfig {
            servers,
            protocol: Protocol::Blocking,
            read_quorum,
            write_quorum,
            num_replicas: Some(n),
        },
        stores,
    }
}

// A port nothing is listening on; connections to it are refused.
pub async fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
