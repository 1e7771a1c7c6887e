//! Execution of a single read against a single node.

use std::time::Duration;

use docdrive_core::bson::{Bson, Document};
use docdrive_core::{DriverError, Query, Reply, Result};
use tracing::instrument;

use crate::cluster::Node;

/// A read bound to no node until [`execute`](ReadOperation::execute) is called.
#[derive(Debug, Clone)]
pub struct ReadOperation {
    query: Query,
    timeout: Option<Duration>,
}

impl ReadOperation {
    /// Creates a read of `query` with no deadline.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            timeout: None,
        }
    }

    /// Sets the deadline for the round-trip.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the query that will be sent.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns the deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sends the query to `node` and checks the reply for server-side failures.
    ///
    /// A deadline expiry is reported as [`DriverError::Timeout`], never as a
    /// network failure. A reply whose `response_to` is not this query's
    /// request id is a [`DriverError::Protocol`] error.
    #[instrument(
        name = "read_operation.execute",
        skip(self, node),
        fields(
            address = %node.info().address,
            namespace = %self.query.full_collection_name(),
            request_id = self.query.request_id(),
        ),
        level = "debug"
    )]
    pub async fn execute(self, node: &dyn Node) -> Result<Reply> {
        let is_command = self.query.is_command();
        let request_id = self.query.request_id();

        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, node.process(self.query))
                .await
                .map_err(|_| {
                    tracing::warn!(timeout = ?limit, "read timed out");
                    DriverError::Timeout(format!(
                        "read on {} did not complete within {:?}",
                        node.info().address,
                        limit
                    ))
                })??,
            None => node.process(self.query).await?,
        };

        if reply.response_to() != request_id {
            tracing::warn!(
                expected = request_id,
                actual = reply.response_to(),
                "reply correlates to a different request"
            );
            return Err(DriverError::Protocol(format!(
                "reply to {} does not answer request {}",
                reply.response_to(),
                request_id
            )));
        }

        check_reply(&reply, is_command)?;
        tracing::trace!(documents = reply.documents().len(), "read completed");
        Ok(reply)
    }
}

fn check_reply(reply: &Reply, is_command: bool) -> Result<()> {
    if reply.is_query_failure() {
        let message = reply
            .first_document()
            .and_then(|doc| doc.get_str("$err"))
            .unwrap_or("query failed");
        return Err(DriverError::Protocol(with_code(message, reply.first_document())));
    }

    if reply.is_cursor_not_found() {
        return Err(DriverError::Protocol(format!(
            "cursor {} not found",
            reply.cursor_id()
        )));
    }

    if is_command {
        if let Some(doc) = reply.first_document() {
            let failed = doc.get("ok").and_then(Bson::as_number) == Some(0.0);
            if failed {
                let message = doc
                    .get_str("errmsg")
                    .or_else(|| doc.get_str("$err"))
                    .unwrap_or("command failed");
                return Err(DriverError::Protocol(with_code(message, Some(doc))));
            }
        }
    }

    Ok(())
}

fn with_code(message: &str, doc: Option<&Document>) -> String {
    match doc.and_then(|d| d.get("code")).and_then(Bson::as_number) {
        Some(code) => format!("{} (code {})", message, code as i64),
        None => message.to_string(),
    }
}
