use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::debug;

use crate::api::metrics;
use crate::api::state::{AbdReplicaState, BlockingReplicaState};
use crate::store::clock::wall_clock_ms;
use crate::util::types::{
    AbdReadRequest, AbdReadResponse, AbdWriteRequest, AbdWriteResponse, BlkReadRequest,
    BlkReadResponse, BlkWriteRequest, BlkWriteResponse, LockRequest, LockResponse, UnlockRequest,
    UnlockResponse,
};

pub fn abd_router(state: AbdReplicaState) -> Router {
    Router::new()
        .route("/abd/read", post(abd_read))
        .route("/abd/write", post(abd_write))
        .route("/ping", get(ping))
        .route("/metrics", get(abd_metrics))
        .with_state(state)
}

pub fn blocking_router(state: BlockingReplicaState) -> Router {
    Router::new()
        .route("/blk/lock", post(blk_lock))
        .route("/blk/unlock", post(blk_unlock))
        .route("/blk/read", post(blk_read))
        .route("/blk/write", post(blk_write))
        .route("/ping", get(ping))
        .route("/metrics", get(blocking_metrics))
        .with_state(state)
}

async fn abd_read(
    State(state): State<AbdReplicaState>,
    Json(req): Json<AbdReadRequest>,
) -> Json<AbdReadResponse> {
    let cell = state.store.read(&req.key).await;
    debug!(key = %req.key, client_ts = req.ts, ts = cell.ts, "abd read");

    state.metrics.reads.inc();

    Json(AbdReadResponse {
        value: cell.value,
        ts: cell.ts,
        ok: true,
    })
}

async fn abd_write(
    State(state): State<AbdReplicaState>,
    Json(req): Json<AbdWriteRequest>,
) -> Json<AbdWriteResponse> {
    let ts = state.store.write(&req.key, req.value, req.ts).await;
    debug!(key = %req.key, client_ts = req.ts, ts, "abd write");

    state.metrics.writes.inc();

    Json(AbdWriteResponse { ok: true, ts })
}

async fn blk_lock(
    State(state): State<BlockingReplicaState>,
    Json(req): Json<LockRequest>,
) -> Json<LockResponse> {
    let granted = state.store.acquire_lock(&req.key, req.client_id).await;
    debug!(key = %req.key, client_id = req.client_id, granted, "acquire lock");

    if granted {
        state.metrics.lock_grants.inc();
    } else {
        state.metrics.lock_denied.inc();
    }

    Json(LockResponse {
        granted,
        ts: wall_clock_ms(),
    })
}

async fn blk_unlock(
    State(state): State<BlockingReplicaState>,
    Json(req): Json<UnlockRequest>,
) -> Json<UnlockResponse> {
    let ok = state.store.release_lock(&req.key, req.client_id).await;
    debug!(key = %req.key, client_id = req.client_id, ok, "release lock");

    if ok {
        state.metrics.lock_releases.inc();
    }

    Json(UnlockResponse { ok })
}

async fn blk_read(
    State(state): State<BlockingReplicaState>,
    Json(req): Json<BlkReadRequest>,
) -> Json<BlkReadResponse> {
    let response = match state.store.read(&req.key, req.client_id).await {
        Some(cell) => {
            state.metrics.reads.inc();
            BlkReadResponse {
                value: cell.value,
                ts: cell.ts,
                ok: true,
            }
        }
        None => {
            state.metrics.not_owner.inc();
            BlkReadResponse {
                value: String::new(),
                ts: 0,
                ok: false,
            }
        }
    };
    debug!(key = %req.key, client_id = req.client_id, ok = response.ok, "blk read");

    Json(response)
}

async fn blk_write(
    State(state): State<BlockingReplicaState>,
    Json(req): Json<BlkWriteRequest>,
) -> Json<BlkWriteResponse> {
    let response = match state.store.write(&req.key, req.value, req.ts, req.client_id).await {
        Some(ts) => {
            state.metrics.writes.inc();
            BlkWriteResponse { ok: true, ts }
        }
        None => {
            state.metrics.not_owner.inc();
            BlkWriteResponse { ok: false, ts: 0 }
        }
    };
    debug!(key = %req.key, client_id = req.client_id, ok = response.ok, ts = response.ts, "blk write");

    Json(response)
}

async fn ping() -> &'static str {
    "pong"
}

async fn abd_metrics(State(state): State<AbdReplicaState>) -> Response {
    metrics::render(&state.metrics.registry)
}

async fn blocking_metrics(State(state): State<BlockingReplicaState>) -> Response {
    metrics::render(&state.metrics.registry)
}
