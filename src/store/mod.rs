pub mod abd;
pub mod blocking;
pub mod clock;

pub use abd::{AbdStore, ValueCell};
pub use blocking::{BlockingStore, LOCK_TIMEOUT};
pub use clock::{ClientClock, TimestampGenerator};
