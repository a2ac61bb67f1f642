//! # teamo-id
//!
//! Typed identifiers for the Teamo coordinator.
//!
//! ## Design Principles
//!
//! - Entry IDs are system-generated; everything else is assigned by the chat
//!   platform and treated as an opaque number
//! - All IDs have a canonical string representation with strict parsing
//! - IDs are typed so an entry can never be confused with a participant
//!
//! ## ID Formats
//!
//! Entry IDs use a prefixed ULID: `ent_01HV4Z2WQXKJNM8GPQY6VBKC3D`. The ULID
//! keeps entries sortable by creation time.
//!
//! Platform IDs (participants, communities, locations, displays) are 64-bit
//! snowflakes and display as plain decimal numbers.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
