use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::cluster::transport::ReplicaTransport;
use crate::cluster::ClientError;
use crate::config::ClusterConfig;
use crate::store::ClientClock;
use crate::util::types::{BlkReadRequest, BlkWriteRequest, LockRequest, UnlockRequest};

// Acquire a quorum of per-key leases, operate on the locked replicas,
// release. Contention surfaces as a failed lock quorum, never as waiting.
pub struct BlockingClient {
    clock: Arc<ClientClock>,
    replicas: Vec<ReplicaTransport>,
    read_quorum: usize,
    write_quorum: usize,
    client_id: i32,
}

impl BlockingClient {
    pub fn new(config: &ClusterConfig, client_id: i32) -> Self {
        let http = reqwest::Client::new();
        let replicas = config
            .servers
            .iter()
            .map(|server| ReplicaTransport::new(http.clone(), &server.host, server.port))
            .collect();
        Self {
            clock: Arc::new(ClientClock::new()),
            replicas,
            read_quorum: config.read_quorum,
            write_quorum: config.write_quorum,
            client_id,
        }
    }

    pub async fn write(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.check_quorum(self.write_quorum)?;
        let locked = self.acquire_lock_quorum(key, self.write_quorum).await?;

        let ts = self.clock.next();
        debug!(key, ts, locked = locked.len(), "blocking write: writing to locked replicas");
        let mut inflight: FuturesUnordered<_> = locked
            .iter()
            .map(|replica| {
                let replica = replica.clone();
                let clock = Arc::clone(&self.clock);
                let request = BlkWriteRequest {
                    key: key.to_string(),
                    value: value.to_string(),
                    ts,
                    client_id: self.client_id,
                };
                tokio::spawn(async move {
                    match replica.blk_write(&request).await {
                        Ok(resp) if resp.ok => {
                            clock.advance_past(resp.ts);
                            true
                        }
                        Ok(_) => false,
                        Err(err) => {
                            debug!(replica = replica.base(), %err, "blocking write rpc failed");
                            false
                        }
                    }
                })
            })
            .collect();

        let mut acked = 0;
        while let Some(joined) = inflight.next().await {
            if matches!(joined, Ok(true)) {
                acked += 1;
            }
        }

        self.release_all(key, &locked).await;

        if acked < self.write_quorum {
            return Err(ClientError::QuorumUnreached {
                got: acked,
                need: self.write_quorum,
            });
        }
        Ok(())
    }

    pub async fn read(&self, key: &str) -> Result<String, ClientError> {
        self.check_quorum(self.read_quorum)?;
        let locked = self.acquire_lock_quorum(key, self.read_quorum).await?;

        debug!(key, locked = locked.len(), "blocking read: reading from locked replicas");
        let mut inflight: FuturesUnordered<_> = locked
            .iter()
            .map(|replica| {
                let replica = replica.clone();
                let clock = Arc::clone(&self.clock);
                let request = BlkReadRequest {
                    key: key.to_string(),
                    client_id: self.client_id,
                };
                tokio::spawn(async move {
                    match replica.blk_read(&request).await {
                        Ok(resp) if resp.ok => {
                            clock.observe(resp.ts);
                            Some(resp)
                        }
                        Ok(_) => None,
                        Err(err) => {
                            debug!(replica = replica.base(), %err, "blocking read rpc failed");
                            None
                        }
                    }
                })
            })
            .collect();

        let mut responses = Vec::new();
        while let Some(joined) = inflight.next().await {
            if let Ok(Some(resp)) = joined {
                responses.push(resp);
            }
        }

        self.release_all(key, &locked).await;

        let best = responses
            .into_iter()
            .max_by_key(|resp| resp.ts)
            .ok_or(ClientError::EmptyReadSet)?;
        Ok(best.value)
    }

    fn check_quorum(&self, need: usize) -> Result<(), ClientError> {
        if need > self.replicas.len() {
            return Err(ClientError::QuorumTooLarge {
                need,
                cluster: self.replicas.len(),
            });
        }
        Ok(())
    }

    // Grants that land after the quorum are handed to a detached reaper that
    // releases them, so no lease leaks.
    async fn acquire_lock_quorum(
        &self,
        key: &str,
        need: usize,
    ) -> Result<Vec<ReplicaTransport>, ClientError> {
        debug!(key, need, replicas = self.replicas.len(), "blocking: requesting locks");
        let mut inflight: FuturesUnordered<_> = self
            .replicas
            .iter()
            .map(|replica| {
                let replica = replica.clone();
                let request = LockRequest {
                    key: key.to_string(),
                    client_id: self.client_id,
                };
                tokio::spawn(async move {
                    match replica.acquire_lock(&request).await {
                        Ok(resp) if resp.granted => Some(replica),
                        Ok(_) => None,
                        Err(err) => {
                            debug!(replica = replica.base(), %err, "lock rpc failed");
                            None
                        }
                    }
                })
            })
            .collect();

        let mut granted = Vec::new();
        while granted.len() < need {
            match inflight.next().await {
                Some(Ok(Some(replica))) => granted.push(replica),
                Some(_) => {}
                None => break,
            }
        }

        if granted.len() < need {
            let got = granted.len();
            debug!(key, got, need, "blocking: lock quorum unreached, releasing");
            self.release_all(key, &granted).await;
            return Err(ClientError::LockQuorumUnreached { got, need });
        }

        let key = key.to_string();
        let client_id = self.client_id;
        tokio::spawn(async move {
            while let Some(joined) = inflight.next().await {
                if let Ok(Some(replica)) = joined {
                    let request = UnlockRequest {
                        key: key.clone(),
                        client_id,
                    };
                    if let Err(err) = replica.release_lock(&request).await {
                        debug!(replica = replica.base(), %err, "late lock release failed");
                    }
                }
            }
        });

        Ok(granted)
    }

    // Best-effort; a lost release just leaves the lease to expire.
    async fn release_all(&self, key: &str, locked: &[ReplicaTransport]) {
        let releases = locked.iter().map(|replica| {
            let request = UnlockRequest {
                key: key.to_string(),
                client_id: self.client_id,
            };
            async move {
                if let Err(err) = replica.release_lock(&request).await {
                    debug!(replica = replica.base(), %err, "lock release failed");
                }
            }
        });
        join_all(releases).await;
    }
}
