//! Public data types for writing and reading chat logs.

pub mod interaction;
pub mod query;
pub mod record;

pub use interaction::Interaction;
pub use query::{Addressing, DEFAULT_LIMIT, Direction, HistoryQuery, Window};
pub use record::{ChatLogRecord, ERR_MAX_CHARS, Metadata, UNKNOWN_ERROR, error_text};
