//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - `SourceId`: opaque exact-match key naming one producer/consumer pairing
//! - `Payload`: (source, raw bytes) as handed over by ingestion
//! - `Message`: textual queued form of one payload body

mod config;
mod error;
mod payload;
mod source_id;

pub use config::*;
pub use error::*;
pub use payload::{Message, Payload};
pub use source_id::SourceId;
