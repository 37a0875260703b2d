//! Row store access for the change feed
//!
//! This crate is the boundary to the relational backend:
//! - Value / Row: the column types the feed tables use
//! - Command: stored procedure call with named parameters
//! - ConnectionFactory / Connection / RowStream: scoped async access
//! - columns: column, procedure and parameter names
//! - MemoryLog: complete in-memory backend with fault injection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod columns;
pub mod command;
pub mod connection;
pub mod memory;
pub mod value;

pub use command::Command;
pub use connection::{Connection, ConnectionFactory, RowStream, VecRowStream};
pub use memory::{FeedRow, MemoryLog, DEFAULT_PARTITION};
pub use value::{Row, Value};
