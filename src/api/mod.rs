pub mod metrics;
pub mod routes;
pub mod state;

pub use metrics::Metrics;
pub use routes::{abd_router, blocking_router};
pub use state::{AbdReplicaState, BlockingReplicaState};
