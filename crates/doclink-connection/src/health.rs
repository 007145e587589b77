//! Link health checks
//!
//! [`Link::ping`](crate::Link::ping) measures a guarded round-trip;
//! [`Link::check_health`](crate::Link::check_health) also watches the handle
//! generation so a check that had to reconnect is reported as degraded.

mod check;
mod status;


pub use check::HealthCheckResult;
pub use status::{HealthStatus, HealthObservation, SLOW_PING_DEFAULT};
