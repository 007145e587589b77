//! DocLink Core - Core abstractions for the document-store connection layer
//!
//! This crate provides the fundamental traits and types that the other
//! DocLink crates depend on. It defines:
//!
//! - `DocumentDriver` - Trait for establishing client handles to a cluster
//! - `DocumentClient` - Trait for a live handle (ping, disconnect, CRUD primitives)
//! - `ClientSettings` - Driver-level connect options
//! - `DocLinkError` - The error taxonomy shared by the link and its drivers

mod driver;
mod error;
mod settings;
mod target;
mod types;

pub use driver::*;
pub use error::*;
pub use settings::*;
pub use target::*;
pub use types::*;

pub use bson;
