//! Domain models for hostscope.
//!
//! Canonical definitions for the values that flow through a search:
//! - `Token`: one classified input name
//! - `LookupOutcome`: per-token resolver result
//! - `DeviceRecord` / `OutputRow`: what the caller renders
//! - `Refusal`: ceiling-triggered refusals

pub mod error;
pub mod row;
pub mod token;

// Re-export main types and errors
pub use error::{HostscopeError, Result};
pub use row::{DeviceRecord, LookupOutcome, OutputRow, Refusal, NOT_AVAILABLE, RETRY_GUIDANCE};
pub use token::{ClassifiedBatch, Token, TokenKind};
