//! Connection traits for the row store
//!
//! Core abstractions the change feed reads through:
//! - ConnectionFactory: hands out one scoped connection per call
//! - Connection: executes a parameterized command
//! - RowStream: yields result rows one at a time
//!
//! A connection is released when it is dropped. Readers hold it in a local
//! binding for exactly one call, so every exit path (success, error, or a
//! cancelled future being dropped) gives it back.

use async_trait::async_trait;
use dicomfeed_core::FeedResult;
use std::collections::VecDeque;

use crate::command::Command;
use crate::value::Row;

/// Source of scoped connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Obtain a connection for the duration of one call
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the backend cannot be reached.
    async fn obtain(&self) -> FeedResult<Box<dyn Connection>>;
}

/// A connection to the row store
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a command and stream its rows
    async fn query(&self, command: &Command) -> FeedResult<Box<dyn RowStream>>;

    /// Execute a command and return the first row (convenience method)
    async fn query_one(&self, command: &Command) -> FeedResult<Option<Row>> {
        let mut stream = self.query(command).await?;
        stream.next().await
    }
}

/// Streaming row iterator
#[async_trait]
pub trait RowStream: Send {
    /// Get the next row, `None` once the result set is exhausted
    async fn next(&mut self) -> FeedResult<Option<Row>>;
}

/// Row stream over an already materialized result set
#[derive(Debug, Default)]
pub struct VecRowStream {
    rows: VecDeque<Row>,
}

impl VecRowStream {
    /// Stream the given rows in order
    pub fn new(rows: Vec<Row>) -> Self {
        VecRowStream { rows: rows.into() }
    }

    /// Rows not yet yielded
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
impl RowStream for VecRowStream {
    async fn next(&mut self) -> FeedResult<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}
