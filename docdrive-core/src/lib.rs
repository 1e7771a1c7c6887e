//! Core types for the docdrive document-database driver.
//!
//! - [`bson`]: the type-tagged binary encoding of documents and values.
//! - [`protocol`]: the query and reply messages of the read path.
//! - [`error`]: the driver-wide error type.

#![warn(missing_docs)]

pub mod bson;
pub mod error;
pub mod protocol;

pub use bson::{Bson, Document, Element, FromElement};
pub use error::{DriverError, Result};
pub use protocol::{Query, QueryFlags, QueryOptions, Reply};
