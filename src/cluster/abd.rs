use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::cluster::transport::ReplicaTransport;
use crate::cluster::ClientError;
use crate::config::ClusterConfig;
use crate::store::ClientClock;
use crate::util::types::{AbdReadRequest, AbdReadResponse, AbdWriteRequest};

// One-round writes, two-round reads: a read queries a read quorum, then
// writes the max-tagged value back to a write quorum before returning it.
pub struct AbdClient {
    clock: Arc<ClientClock>,
    replicas: Vec<ReplicaTransport>,
    read_quorum: usize,
    write_quorum: usize,
}

impl AbdClient {
    pub fn new(config: &ClusterConfig) -> Self {
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
        }
    }

    pub async fn write(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.check_quorum(self.write_quorum)?;

        let ts = self.clock.next();
        debug!(key, ts, replicas = self.replicas.len(), "abd write: fan-out");
        self.write_fanout(key, value, ts).await
    }

    pub async fn read(&self, key: &str) -> Result<String, ClientError> {
        self.check_quorum(self.read_quorum)?;
        self.check_quorum(self.write_quorum)?;

        // Phase 1: query every replica, stop at the first R successes.
        let client_ts = self.clock.current();
        debug!(key, client_ts, replicas = self.replicas.len(), "abd read: query fan-out");
        let mut inflight: FuturesUnordered<_> = self
            .replicas
            .iter()
            .map(|replica| {
                let replica = replica.clone();
                let clock = Arc::clone(&self.clock);
                let request = AbdReadRequest {
                    key: key.to_string(),
                    ts: client_ts,
                };
                tokio::spawn(async move {
                    match replica.abd_read(&request).await {
                        Ok(resp) if resp.ok => {
                            clock.observe(resp.ts);
                            Some(resp)
                        }
                        Ok(_) => None,
                        Err(err) => {
                            debug!(replica = replica.base(), %err, "abd read rpc failed");
                            None
                        }
                    }
                })
            })
            .collect();

        let mut responses: Vec<AbdReadResponse> = Vec::new();
        while responses.len() < self.read_quorum {
            match inflight.next().await {
                Some(Ok(Some(resp))) => responses.push(resp),
                Some(_) => {}
                None => break,
            }
        }
        // Stragglers stay spawned and still feed their tags into the clock.
        drop(inflight);

        if responses.len() < self.read_quorum {
            return Err(ClientError::QuorumUnreached {
                got: responses.len(),
                need: self.read_quorum,
            });
        }

        let best = match responses.into_iter().max_by_key(|resp| resp.ts) {
            Some(best) => best,
            None => {
                return Err(ClientError::QuorumUnreached {
                    got: 0,
                    need: self.read_quorum,
                })
            }
        };

        // Phase 2: install the winner at a write quorum before returning it.
        let ts_wb = self.clock.advance_past(best.ts);
        debug!(key, max_ts = best.ts, ts_wb, "abd read: write-back");
        self.write_fanout(key, &best.value, ts_wb).await?;

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

    // Returns once W replicas acknowledge; acks past the quorum still
    // advance the clock inside their detached tasks.
    async fn write_fanout(&self, key: &str, value: &str, ts: i64) -> Result<(), ClientError> {
        let mut inflight: FuturesUnordered<_> = self
            .replicas
            .iter()
            .map(|replica| {
                let replica = replica.clone();
                let clock = Arc::clone(&self.clock);
                let request = AbdWriteRequest {
                    key: key.to_string(),
                    value: value.to_string(),
                    ts,
                };
                tokio::spawn(async move {
                    match replica.abd_write(&request).await {
                        Ok(resp) if resp.ok => {
                            clock.advance_past(resp.ts);
                            true
                        }
                        Ok(_) => false,
                        Err(err) => {
                            debug!(replica = replica.base(), %err, "abd write rpc failed");
                            false
                        }
                    }
                })
            })
            .collect();

        let mut acked = 0;
        while acked < self.write_quorum {
            match inflight.next().await {
                Some(Ok(true)) => acked += 1,
                Some(_) => {}
                None => {
                    return Err(ClientError::QuorumUnreached {
                        got: acked,
                        need: self.write_quorum,
                    })
                }
            }
        }
        Ok(())
    }
}
