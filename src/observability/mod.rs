//! Observability for rosterdb
//!
//! - Structured logging through `tracing`
//! - Monotonic operation counters
//! - Named lifecycle events
//!
//! Observability is read-only: nothing here feeds back into store
//! behavior, and a logging failure never fails an operation.

mod events;
mod logging;
mod metrics;

pub use events::Event;
pub use logging::{init as init_logging, LogFormat, DEFAULT_FILTER};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at the level its severity implies
pub fn log_event(event: Event) {
    if event.is_fatal() {
        tracing::error!(event = event.as_str());
    } else {
        tracing::info!(event = event.as_str());
    }
}
