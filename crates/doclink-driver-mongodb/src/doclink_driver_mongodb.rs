//! MongoDB driver for DocLink
//!
//! Implements the DocLink driver traits over the official `mongodb` crate.
//!
//! # Features
//!
//! - Client options derived from the link's `ClientSettings`
//! - Primary ping as the health probe
//! - Collection-scoped CRUD primitives
//! - Classification of driver errors, including the disconnect signature
//! - Connection string assembly from discrete fields
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use doclink_connection::{Link, LinkOptions};
//! use doclink_driver_mongodb::{MongoDbDriver, MongoUriBuilder};
//!
//! let uri = MongoUriBuilder::new("db1.internal")
//!     .with_database("billing")
//!     .with_credentials("app", "s3cret")
//!     .build();
//! let options = LinkOptions::builder(uri).with_max_attempts(3).build()?;
//! let link = Link::new(options, Arc::new(MongoDbDriver::new())).await?;
//! ```

mod driver;
#[cfg(test)]
mod driver_tests;
mod errors;
mod uri;

pub use driver::*;
pub use errors::{classify, is_disconnect_kind};
pub use uri::MongoUriBuilder;
