//! # chatlog-store
//!
//! Persistent log of chat interactions with windowed history reads.
//!
//! - **Event logger**: one `chatlogs` row per conversation turn, with optional error text
//! - **History reader**: latest / before-anchor / after-anchor windows, always oldest first
//! - **Codec**: date-aware conversion between JSON and in-memory payload trees
//! - **`SQLite` backend**: pooled connections, versioned migrations, a stateless repository
//! - **Providers**: lazily opened, migrated databases behind an async trait

#![deny(unsafe_code)]

pub mod codec;
pub mod errors;
pub mod history;
pub mod logger;
pub mod provider;
pub mod sqlite;
pub mod types;

pub use codec::{StructuredValue, decode, encode};
pub use errors::{Result, StoreError};
pub use history::InteractionHistoryReader;
pub use logger::EventLogger;
pub use provider::{ConnectionProvider, PoolProvider, SqliteProvider};
pub use types::{Addressing, ChatLogRecord, HistoryQuery, Interaction, Metadata};
