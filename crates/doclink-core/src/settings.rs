//! Driver-level connect options

use std::time::Duration;

/// Minimum number of pooled connections a driver keeps open
pub const MIN_POOL_SIZE_DEFAULT: u32 = 10;

/// How long an idle pooled connection may live before the driver closes it
pub const MAX_IDLE_TIME_DEFAULT: Duration = Duration::from_secs(8 * 60 * 60);

/// Options handed to [`crate::DocumentDriver::connect`].
///
/// These are derived from the link configuration; drivers map them onto
/// their own client options and must not apply their own defaults on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Advisory name reported to the server
    pub app_name: Option<String>,
    /// Bound on establishing a connection and selecting a server
    pub connect_timeout: Duration,
    /// Bound on a single data operation
    pub operation_timeout: Duration,
    /// Minimum pool size
    pub min_pool_size: u32,
    /// Maximum idle time for pooled connections
    pub max_idle_time: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            app_name: None,
            connect_timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(10),
            min_pool_size: MIN_POOL_SIZE_DEFAULT,
            max_idle_time: MAX_IDLE_TIME_DEFAULT,
        }
    }
}
