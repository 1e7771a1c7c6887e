//! Sessions bind a configuration, a cluster and a read preference together.

use std::fmt;
use std::sync::Arc;

use docdrive_core::bson::Document;
use docdrive_core::{DriverError, Query, Result};

use crate::cluster::Cluster;
use crate::config::{validate_database_name, ClientConfig};
use crate::read_preference::{read_preference, ReadPreference};
use crate::router::Readable;

/// The entry point for issuing reads.
///
/// Cloning a session is cheap; clones share the cluster view.
#[derive(Clone)]
pub struct Session {
    config: Arc<ClientConfig>,
    cluster: Arc<dyn Cluster>,
    read_preference: Arc<dyn ReadPreference>,
}

impl Session {
    /// Creates a session over `cluster` using the read preference described
    /// by `config`.
    pub fn new(config: ClientConfig, cluster: Arc<dyn Cluster>) -> Result<Self> {
        let read_preference = read_preference(config.read_mode(), config.tag_sets().to_vec())?;
        tracing::debug!(
            mode = %read_preference.mode(),
            database = ?config.database(),
            "session created"
        );
        Ok(Self {
            config: Arc::new(config),
            cluster,
            read_preference,
        })
    }

    /// Returns a session sharing this one's cluster but reading through
    /// `read_preference`.
    pub fn with_read_preference(&self, read_preference: Arc<dyn ReadPreference>) -> Self {
        Self {
            config: Arc::clone(&self.config),
            cluster: Arc::clone(&self.cluster),
            read_preference,
        }
    }

    /// Returns the session's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the cluster view.
    pub fn cluster(&self) -> &dyn Cluster {
        self.cluster.as_ref()
    }

    /// Returns the read preference.
    pub fn read_preference(&self) -> &dyn ReadPreference {
        self.read_preference.as_ref()
    }

    /// Returns a handle to the database `name`.
    pub fn database(&self, name: &str) -> Result<Database<'_>> {
        validate_database_name(name)?;
        Ok(Database {
            session: self,
            name: name.to_string(),
        })
    }

    /// Returns a handle to the configured default database.
    pub fn current_database(&self) -> Result<Database<'_>> {
        let name = self.config.database().ok_or_else(|| {
            DriverError::Configuration("no default database configured".to_string())
        })?;
        self.database(name)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("read_preference", &self.read_preference)
            .finish_non_exhaustive()
    }
}

impl Readable for Session {
    fn session(&self) -> &Session {
        self
    }
}

/// A database reached through a session.
#[derive(Debug, Clone)]
pub struct Database<'a> {
    session: &'a Session,
    name: String,
}

impl Database<'_> {
    /// Returns the database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `command` against `<db>.$cmd` and returns the result document.
    pub async fn command(&self, command: Document) -> Result<Document> {
        let reply = self.read(Query::command(&self.name, command)).await?;
        reply
            .into_documents()
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::Protocol("command returned no document".to_string()))
    }

    /// Returns the documents of `collection` matching `selector`, as carried
    /// by the first reply batch.
    pub async fn find(&self, collection: &str, selector: Document) -> Result<Vec<Document>> {
        let reply = self.read(Query::new(&self.name, collection, selector)).await?;
        Ok(reply.into_documents())
    }
}

impl Readable for Database<'_> {
    fn session(&self) -> &Session {
        self.session
    }
}
