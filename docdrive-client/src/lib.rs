//! Read routing and session layer for the docdrive document-database driver.
//!
//! Reads are sent to exactly one cluster node, chosen by a pluggable
//! [`ReadPreference`]. The same preference decides which query flags go out
//! with the read. Every operation is an `async fn` on [Tokio](https://tokio.rs/).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docdrive_client::{ClientConfig, ReadMode, Session, StaticCluster};
//! use docdrive_client::core::doc;
//!
//! # async fn run(cluster: StaticCluster) -> docdrive_client::core::Result<()> {
//! let config = ClientConfig::builder()
//!     .database("inventory")
//!     .read_mode(ReadMode::SecondaryPreferred)
//!     .build()?;
//! let session = Session::new(config, Arc::new(cluster))?;
//!
//! let database = session.current_database()?;
//! let status = database.command(doc! { "ping" => 1i32 }).await?;
//! let items = database.find("items", doc! { "sku" => "A-100" }).await?;
//! println!("{:?} {}", status, items.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Read Preferences
//!
//! | Mode | Selects | Adds `SLAVE_OK` |
//! |------|---------|-----------------|
//! | [`Primary`] | the primary only | no |
//! | [`PrimaryPreferred`] | the primary, else a secondary | yes |
//! | [`Secondary`] | a secondary only | yes |
//! | [`SecondaryPreferred`] | a secondary, else the primary | yes |
//! | [`Nearest`] | the lowest-latency member | yes |
//!
//! All modes except [`Primary`] accept [`TagSet`]s, tried in order.
//!
//! # Errors
//!
//! A read that found no eligible node fails with
//! [`DriverError::NoEligibleNode`](docdrive_core::DriverError::NoEligibleNode)
//! before any node is contacted. Failures of the chosen node surface as
//! `Network`, `Protocol` or `Timeout`.

#![warn(missing_docs)]

pub mod cluster;
pub mod config;
pub mod operation;
pub mod read_preference;
pub mod router;
pub mod session;

pub use cluster::{Cluster, Node, NodeInfo, NodeRole, StaticCluster};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use docdrive_core as core;
pub use operation::ReadOperation;
pub use read_preference::{
    read_preference, Nearest, Primary, PrimaryPreferred, ReadMode, ReadPreference, Secondary,
    SecondaryPreferred, TagSet,
};
pub use router::{read, ReadRouter, Readable};
pub use session::{Database, Session};
