//! Link configuration
//!
//! Raw tunables are collected in a [`LinkOptionsBuilder`] (directly or from a
//! [`LinkConfigFile`]) and normalized into an immutable [`LinkOptions`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use doclink_connection::config::LinkOptions;
//!
//! let options = LinkOptions::builder("mongodb://127.0.0.1:27017/shop")
//!     .with_application_name("inventory")
//!     .with_max_attempts(3)
//!     .with_operation_timeout(Duration::from_millis(200))
//!     .build()
//!     .unwrap();
//!
//! // Below the one-second floor, so the default applies
//! assert_eq!(options.operation_timeout(), Duration::from_secs(10));
//! ```

mod file;
mod options;


pub use file::LinkConfigFile;
pub use options::{
    APPLICATION_NAME_DEFAULT, CONNECT_TIMEOUT_DEFAULT, CONNECT_TIMEOUT_MIN, LinkOptions,
    LinkOptionsBuilder, OPERATION_TIMEOUT_DEFAULT, OPERATION_TIMEOUT_MIN, RETRY_INTERVAL_DEFAULT,
    RETRY_INTERVAL_MIN, Substitution,
};
