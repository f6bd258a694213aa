pub mod abd;
pub mod blocking;
pub mod transport;

pub use abd::AbdClient;
pub use blocking::BlockingClient;
pub use transport::{ReplicaTransport, TransportError, RPC_DEADLINE};

use thiserror::Error;

use crate::config::{ClusterConfig, Protocol};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("quorum of {need} exceeds cluster size {cluster}")]
    QuorumTooLarge { need: usize, cluster: usize },
    #[error("quorum unreached: {got} of {need} replicas acknowledged")]
    QuorumUnreached { got: usize, need: usize },
    #[error("lock quorum unreached: {got} of {need} grants")]
    LockQuorumUnreached { got: usize, need: usize },
    #[error("no locked replica returned a value")]
    EmptyReadSet,
}

// Coordinator variant selected by the config's protocol field.
pub enum KvClient {
    Abd(AbdClient),
    Blocking(BlockingClient),
}

impl KvClient {
    // client_id only matters for the blocking protocol, where it names the
    // lease owner.
    pub fn from_config(config: &ClusterConfig, client_id: i32) -> Self {
        match config.protocol {
            Protocol::Abd => Self::Abd(AbdClient::new(config)),
            Protocol::Blocking => Self::Blocking(BlockingClient::new(config, client_id)),
        }
    }

    pub async fn read(&self, key: &str) -> Result<String, ClientError> {
        match self {
            Self::Abd(client) => client.read(key).await,
            Self::Blocking(client) => client.read(key).await,
        }
    }

    pub async fn write(&self, key: &str, value: &str) -> Result<(), ClientError> {
        match self {
            Self::Abd(client) => client.write(key, value).await,
            Self::Blocking(client) => client.write(key, value).await,
        }
    }
}
