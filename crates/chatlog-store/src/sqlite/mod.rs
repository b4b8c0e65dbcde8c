//! `SQLite` backend: pooling, schema, rows and repositories.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod row_types;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection};
pub use repositories::ChatLogRepo;
pub use row_types::{ChatLogRow, NewChatLogRow};
