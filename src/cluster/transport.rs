use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;

use crate::util::types::{
    AbdReadRequest, AbdReadResponse, AbdWriteRequest, AbdWriteResponse, BlkReadRequest,
    BlkReadResponse, BlkWriteRequest, BlkWriteResponse, LockRequest, LockResponse, UnlockRequest,
    UnlockResponse,
};

// Deadline expiry counts as a missing response, not a refusal.
pub const RPC_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rpc deadline exceeded")]
    Deadline,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

// One replica endpoint. Clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReplicaTransport {
    http: Client,
    base: String,
}

impl ReplicaTransport {
    pub fn new(http: Client, host: &str, port: u16) -> Self {
        Self {
            http,
            base: format!("http://{host}:{port}"),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn call<Req, Resp>(&self, path: &str, req: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base, path);
        let exchange = async {
            let response = self.http.post(&url).json(req).send().await?;
            response.error_for_status()?.json::<Resp>().await
        };
        match timeout(RPC_DEADLINE, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(TransportError::Http(err)),
            Err(_) => Err(TransportError::Deadline),
        }
    }

    pub async fn abd_read(&self, req: &AbdReadRequest) -> Result<AbdReadResponse, TransportError> {
        self.call("/abd/read", req).await
    }

    pub async fn abd_write(&self, req: &AbdWriteRequest) -> Result<AbdWriteResponse, TransportError> {
        self.call("/abd/write", req).await
    }

    pub async fn acquire_lock(&self, req: &LockRequest) -> Result<LockResponse, TransportError> {
        self.call("/blk/lock", req).await
    }

    pub async fn release_lock(&self, req: &UnlockRequest) -> Result<UnlockResponse, TransportError> {
        self.call("/blk/unlock", req).await
    }

    pub async fn blk_read(&self, req: &BlkReadRequest) -> Result<BlkReadResponse, TransportError> {
        self.call("/blk/read", req).await
    }

    pub async fn blk_write(&self, req: &BlkWriteRequest) -> Result<BlkWriteResponse, TransportError> {
        self.call("/blk/write", req).await
    }
}
