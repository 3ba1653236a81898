//! Shared types used across all parlor crates.

pub mod types;

pub use types::{ChatType, ReplyKind, ReplyPayload};
