//! Observability utilities.

mod subscriber;
mod timer;

pub use subscriber::{init_tracing, TracingConfig};
pub use timer::SpanTimer;
