//! Tracery Core - Shared domain types
//!
//! This crate defines the transfer event that flows from the chain feed
//! into the graph maintainer, along with its validation rules. Every other
//! crate in the workspace speaks in these types.

mod transfer;

pub use transfer::{Transfer, TransferError};
