use std::sync::Arc;

use crate::api::Metrics;
use crate::store::{AbdStore, BlockingStore};

#[derive(Clone)]
pub struct AbdReplicaState {
    pub store: Arc<AbdStore>,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct BlockingReplicaState {
    pub store: Arc<BlockingStore>,
    pub metrics: Metrics,
}
