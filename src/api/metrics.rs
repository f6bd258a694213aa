use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub reads: IntCounter,
    pub writes: IntCounter,
    pub lock_grants: IntCounter,
    pub lock_releases: IntCounter,
    pub lock_denied: IntCounter,
    pub not_owner: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).unwrap();
    registry.register(Box::new(counter.clone())).unwrap();
    counter
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        Self {
            reads: counter(&registry, "kv_reads_total", "Values served to clients"),
            writes: counter(&registry, "kv_writes_total", "Values installed"),
            lock_grants: counter(&registry, "lock_grants_total", "Leases granted, including re-entrant and preempting grants"),
            lock_releases: counter(&registry, "lock_releases_total", "Leases released by their owner"),
            lock_denied: counter(&registry, "lock_denied_total", "Lease requests refused while a rival lease was live"),
            not_owner: counter(&registry, "not_owner_total", "Reads or writes refused for lack of the lease"),
            registry,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render(registry: &Registry) -> Response {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&registry.gather(), &mut buffer).unwrap();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
