//! # chatlog-core
//!
//! Shared foundation for the chat log crates.
//!
//! - **Logging**: `tracing` subscriber setup and an in-memory capture layer for tests
//! - **Text**: char-boundary-safe truncation used when persisting error strings

#![deny(unsafe_code)]

pub mod logging;
pub mod text;
